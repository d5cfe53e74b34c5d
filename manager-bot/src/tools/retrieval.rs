//! `AllSeeTeamInfoRetriever`: knowledge base search exposed as a tool.

use async_trait::async_trait;
use knowledge_base::KnowledgeIndex;
use prompt::ToolSpec;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{RequestContext, Tool, ToolError};

pub const RETRIEVAL_TOOL_NAME: &str = "AllSeeTeamInfoRetriever";

/// Tool output when the index has nothing to return.
pub const NOTHING_FOUND: &str = "По этому запросу в базе знаний AllSee.team ничего не найдено.";

const DESCRIPTION: &str = "Найти релевантную информацию о компании AllSee.team по запросу. \
Для запроса сформулируй максимально развёрнутый вопрос, содержащий точное название раздела из базы знаний \
и все детали запрашиваемой информации. В базе есть следующие разделы:
- Почему мы?
- Кто мы?
- Наша миссия
- Профиль компании
- Философия
- Ценности
- Легенда и история
- Сферы деятельности, с которыми мы работаем
- Портреты потребителей
- Этапы принятия решения о работе с нами
- Наши услуги
- Преимущества и результаты от внедрения ИИ
- Преимущества решений для наших сфер";

#[derive(Debug, Deserialize)]
struct RetrievalArgs {
    query: String,
}

/// Returns the texts of the `top_k` most similar sections, separated by a blank line.
pub struct AllSeeTeamInfoRetriever {
    index: KnowledgeIndex,
    top_k: usize,
}

impl AllSeeTeamInfoRetriever {
    pub fn new(index: KnowledgeIndex, top_k: usize) -> Self {
        Self { index, top_k }
    }

    pub async fn search(&self, query: &str) -> Result<String, ToolError> {
        let hits = self
            .index
            .search(query, self.top_k)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        info!(
            collection = %self.index.collection(),
            hits = hits.len(),
            headers = ?hits.iter().map(|h| h.header.as_str()).collect::<Vec<_>>(),
            "Knowledge base searched"
        );
        if hits.is_empty() {
            return Ok(NOTHING_FOUND.to_string());
        }
        Ok(hits
            .into_iter()
            .map(|h| h.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[async_trait]
impl Tool for AllSeeTeamInfoRetriever {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: RETRIEVAL_TOOL_NAME.to_string(),
            description: DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Развёрнутый вопрос к базе знаний"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        arguments: serde_json::Value,
        _ctx: &RequestContext,
    ) -> Result<String, ToolError> {
        let args: RetrievalArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        self.search(&args.query).await
    }
}
