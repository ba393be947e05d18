use serde_json::{json, Value};

/// Build a Jira Atlassian Document Format (ADF) document from plain text.
///
/// Blank lines separate paragraphs and single newlines become hard breaks.
/// ADF rejects empty text nodes, so empty input yields a document with no content.
pub fn text_to_adf(text: &str) -> Value {
    let normalized = text.replace("\r\n", "\n");
    let paragraphs: Vec<Value> = normalized
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(paragraph)
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs,
    })
}

fn paragraph(block: &str) -> Value {
    let mut content = Vec::new();
    for (i, line) in block.trim_matches('\n').split('\n').enumerate() {
        if i > 0 {
            content.push(json!({ "type": "hardBreak" }));
        }
        if !line.is_empty() {
            content.push(json!({ "type": "text", "text": line }));
        }
    }
    json!({ "type": "paragraph", "content": content })
}
