//! Tests for `SendDocumentToUser`: every outcome is a `ReplyResult`, and a failed send is never
//! reported as a success.

mod common;

use std::sync::Arc;

use common::{ctx, sqlite_graph, tool_call, MockBot, ScriptedModel, Sent};
use manager_bot::tools::SEND_DOCUMENT_TOOL_NAME;
use manager_bot::{manager_graph, ManagerAgent, ReplyResult, SendDocumentToUser, Tool, ToolBox};
use prompt::{ChatMessage, MessageRole};
use serde_json::json;
use tempfile::TempDir;

fn write_doc(dir: &TempDir) -> String {
    let path = dir.path().join("presentation.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();
    path.to_string_lossy().into_owned()
}

async fn call(bot: Arc<MockBot>, arguments: serde_json::Value) -> ReplyResult {
    let output = SendDocumentToUser::new()
        .call(arguments, &ctx(55, bot))
        .await
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

/// **Test: The file goes to the request's chat with the caption converted to Telegram HTML.**
#[tokio::test]
async fn sends_to_request_chat() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir);
    let bot = MockBot::new();

    let result = call(
        bot.clone(),
        json!({"reply_document_path": path, "reply_text": "**Презентация** <AllSee>"}),
    )
    .await;

    assert_eq!(result, ReplyResult::ok());
    assert_eq!(
        bot.sent(),
        vec![Sent::Document {
            chat_id: 55,
            path: path.into(),
            caption: Some("<b>Презентация</b> &lt;AllSee&gt;".to_string()),
        }]
    );
}

/// **Test: A missing caption and a null caption both send no caption.**
#[tokio::test]
async fn caption_is_optional() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir);
    let bot = MockBot::new();

    assert!(call(bot.clone(), json!({"reply_document_path": path})).await.success);
    assert!(
        call(bot.clone(), json!({"reply_document_path": path, "reply_text": null}))
            .await
            .success
    );
    for sent in bot.sent() {
        match sent {
            Sent::Document { caption, .. } => assert!(caption.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }
}

/// **Test: A transport error yields success=false with the error text.**
#[tokio::test]
async fn send_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir);
    let bot = MockBot::failing_documents();

    let result = call(bot.clone(), json!({"reply_document_path": path})).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("file is too big"));
    assert!(bot.sent().is_empty());
}

/// **Test: A path that does not exist fails before anything is sent.**
#[tokio::test]
async fn missing_file_fails_without_sending() {
    let dir = TempDir::new().unwrap();
    let bot = MockBot::new();
    let missing = dir.path().join("nope.pdf");

    let result = call(
        bot.clone(),
        json!({"reply_document_path": missing.to_string_lossy()}),
    )
    .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("nope.pdf"));
    assert!(bot.sent().is_empty());
}

/// **Test: Missing required arguments are reported as a failed ReplyResult, not an error.**
#[tokio::test]
async fn invalid_arguments_are_a_failed_result() {
    let result = call(MockBot::new(), json!({"reply_text": "hi"})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("invalid arguments"));
}

/// **Test: Through the agent, the model sees the failure in the tool message.**
#[tokio::test]
async fn agent_sees_failure() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir);
    let model = ScriptedModel::new(vec![
        tool_call("call_1", SEND_DOCUMENT_TOOL_NAME, json!({"reply_document_path": path})),
        ChatMessage::assistant("Не удалось отправить файл."),
    ]);
    let tools = ToolBox::new().with_tool(Arc::new(SendDocumentToUser::new()));
    let graph = sqlite_graph(
        dir.path(),
        &manager_graph(ManagerAgent::new(model, tools, "system", 3)),
    )
    .await;

    let state = graph
        .invoke(
            "55",
            vec![ChatMessage::user("пришлите презентацию")],
            ctx(55, MockBot::failing_documents()),
        )
        .await
        .unwrap();

    let tool_msg = state
        .messages
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .unwrap();
    let result: ReplyResult = serde_json::from_str(&tool_msg.content).unwrap();
    assert!(!result.success);
    assert!(result.error.is_some());
}
