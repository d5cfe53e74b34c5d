//! Level-1 header splitter for the knowledge document.
//!
//! A section starts at every `# Title` line outside a fenced code block and runs until the next
//! one. The header line stays inside the section text. Text before the first header forms a
//! section with an empty header.

/// A header-delimited chunk of the knowledge document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text without the leading `# ` (empty for the preamble).
    pub header: String,
    /// Full section text, header line included, without leading/trailing blank lines.
    pub text: String,
}

impl Section {
    /// True when the section has no header and its text is nothing but `#`, newlines and
    /// whitespace. Such sections are dropped before indexing.
    pub fn is_blank(&self) -> bool {
        self.header.trim().is_empty()
            && self.text.chars().all(|c| c == '#' || c.is_whitespace())
    }
}

/// Returns the header text when `line` is a level-1 header (`#`, whitespace, then text).
fn level_one_header(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix('#')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some(title)
}

/// Returns the fence marker when `line` opens or closes a fenced code block.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn finish(header: String, lines: &[&str]) -> Section {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    Section {
        header,
        text: lines[start..end.max(start)].join("\n"),
    }
}

/// Splits markdown into sections at level-1 headers. Deterministic; keeps blank sections.
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut header = String::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut open_fence: Option<&'static str> = None;

    for line in markdown.lines() {
        if let Some(marker) = fence_marker(line) {
            match open_fence {
                Some(open) if open == marker => open_fence = None,
                None => open_fence = Some(marker),
                Some(_) => {}
            }
            lines.push(line);
            continue;
        }
        if open_fence.is_none() {
            if let Some(title) = level_one_header(line) {
                if !lines.is_empty() {
                    sections.push(finish(std::mem::take(&mut header), &lines));
                    lines.clear();
                }
                header = title.to_string();
            }
        }
        lines.push(line);
    }
    if !lines.is_empty() {
        sections.push(finish(header, &lines));
    }
    sections
}

/// Splits and drops blank sections (see [`Section::is_blank`]).
pub fn split_and_filter(markdown: &str) -> Vec<Section> {
    split_sections(markdown)
        .into_iter()
        .filter(|s| !s.is_blank())
        .collect()
}
