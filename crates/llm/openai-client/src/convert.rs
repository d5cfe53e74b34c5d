//! Conversion between [`prompt`] types and async-openai request/response types.

use anyhow::Result;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseMessage, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, FunctionCall, FunctionObjectArgs,
};
use prompt::{ChatMessage, MessageRole, ToolCall, ToolSpec};

/// Converts a single [`ChatMessage`] into OpenAI API message format.
///
/// Assistant turns keep their tool calls; an assistant turn with tool calls and empty content is
/// sent without `content`. Tool turns require `tool_call_id`.
pub fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !content.is_empty() || msg.tool_calls.is_empty() {
                args.content(content);
            }
            if !msg.tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = msg
                    .tool_calls
                    .iter()
                    .map(|c| ChatCompletionMessageToolCall {
                        id: c.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect();
                args.tool_calls(calls);
            }
            args.build()?.into()
        }
        MessageRole::Tool => {
            let call_id = msg
                .tool_call_id
                .clone()
                .ok_or_else(|| anyhow::anyhow!("tool message without tool_call_id"))?;
            ChatCompletionRequestToolMessageArgs::default()
                .content(content)
                .tool_call_id(call_id)
                .build()?
                .into()
        }
    };
    Ok(openai_msg)
}

/// Converts a whole message list, failing on the first invalid message.
pub fn to_openai_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages.iter().map(to_openai_message).collect()
}

/// Converts a [`ToolSpec`] into an OpenAI function tool.
pub fn to_openai_tool(spec: &ToolSpec) -> Result<ChatCompletionTool> {
    let function = FunctionObjectArgs::default()
        .name(spec.name.clone())
        .description(spec.description.clone())
        .parameters(spec.parameters.clone())
        .build()?;
    Ok(ChatCompletionToolArgs::default()
        .r#type(ChatCompletionToolType::Function)
        .function(function)
        .build()?)
}

/// Converts the first-choice response message into an assistant [`ChatMessage`].
pub fn from_openai_response(message: ChatCompletionResponseMessage) -> ChatMessage {
    let content = message.content.unwrap_or_default();
    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| ToolCall {
            id: c.id,
            name: c.function.name,
            arguments: c.function.arguments,
        })
        .collect();
    ChatMessage::assistant_with_tool_calls(content, tool_calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_without_call_id_is_rejected() {
        let mut msg = ChatMessage::tool("id", "t", "x");
        msg.tool_call_id = None;
        assert!(to_openai_message(&msg).is_err());
    }

    #[test]
    fn assistant_tool_calls_are_forwarded() {
        let msg = ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_9".into(),
                name: "AllSeeTeamInfoRetriever".into(),
                arguments: "{}".into(),
            }],
        );
        let converted = to_openai_message(&msg).unwrap();
        let json = serde_json::to_value(&converted).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["id"], "call_9");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "AllSeeTeamInfoRetriever");
        assert!(json.get("content").map_or(true, |c| c.is_null()));
    }

    #[test]
    fn tool_spec_becomes_function_tool() {
        let spec = ToolSpec {
            name: "SendDocumentToUser".into(),
            description: "send".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let tool = to_openai_tool(&spec).unwrap();
        assert_eq!(tool.function.name, "SendDocumentToUser");
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["type"], "function");
    }
}
