//! Deterministic embedder for index tests.
//!
//! Each dimension counts the words containing one vocabulary stem, so similarity follows shared
//! keywords and never depends on hashing.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use embedding::EmbeddingService;

pub const VOCABULARY: &[&str] = &["кто", "миссия", "ценност", "услуг", "команд", "ии"];

#[derive(Default)]
pub struct KeywordEmbedder {
    pub batch_calls: AtomicUsize,
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    VOCABULARY
        .iter()
        .map(|stem| words.iter().filter(|w| w.contains(stem)).count() as f32)
        .collect()
}

#[async_trait]
impl EmbeddingService for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

pub const SAMPLE_DOC: &str = "\
# Почему мы?
Потому что мы делаем ИИ полезным.

# Кто мы?
Мы команда AllSee, студия разработки решений на базе ИИ.

## Состав
Инженеры и аналитики.

# Наша миссия
Миссия: сделать технологии доступными.

```text
# это не заголовок
```

#

# Ценности
Честность и ответственность.
";
