//! Wire frame encoding/decoding for the agent CLI protocol.
//!
//! The protocol is newline-delimited JSON: one frame per line, camelCase
//! field names, and a `type` field tagging each inbound frame. This module
//! is pure (no I/O); [`process`](super::process) feeds it lines from the
//! subprocess and writes the lines it produces.
//!
//! Decoding is deliberately forgiving: an unknown `type`, or a known
//! `type` with a payload this build cannot parse, becomes
//! [`InboundEvent::Unrecognized`] so the session survives protocol
//! evolution. Only a line that is not JSON at all is a decode error.

use serde::Deserialize;
use serde_json::Value;
use tether_domain::{
    DeltaPayload, InboundEvent, OutboundMessage, ToolInvocation, ToolResultPayload, TurnFailure,
    TurnOutcome, TurnSuccess, Usage,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInitFrame {
    session_id: String,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum DeltaFrame {
    Text { text: String },
    PartialToolInput { json: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockFrame {
    block_kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvocationFrame {
    id: String,
    name: String,
    #[serde(default)]
    input: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssistantTurnFrame {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tool_invocations: Vec<InvocationFrame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultFrame {
    invocation_id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_error: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultsFrame {
    results: Vec<ToolResultFrame>,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum OutcomeFrame {
    #[serde(rename_all = "camelCase")]
    Success {
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        cost_usd: f64,
        #[serde(default)]
        usage: UsageFrame,
    },
    Failure {
        error: String,
    },
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageFrame {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Decode one inbound line into an event.
///
/// Errors only when the line is not valid JSON; every structural surprise
/// inside valid JSON degrades to [`InboundEvent::Unrecognized`].
pub fn decode_line(line: &str) -> Result<InboundEvent, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;
    Ok(decode_event(value))
}

fn decode_event(value: Value) -> InboundEvent {
    let Some(tag) = value.get("type").and_then(|t| t.as_str()).map(String::from) else {
        return InboundEvent::Unrecognized {
            tag: "(untagged)".to_string(),
        };
    };

    let unrecognized = || InboundEvent::Unrecognized { tag: tag.clone() };

    match tag.as_str() {
        "session_init" => match serde_json::from_value::<SessionInitFrame>(value) {
            Ok(frame) => InboundEvent::SessionInit {
                session_id: frame.session_id,
            },
            Err(_) => unrecognized(),
        },

        "delta" => match value
            .get("delta")
            .cloned()
            .map(serde_json::from_value::<DeltaFrame>)
        {
            Some(Ok(DeltaFrame::Text { text })) => {
                InboundEvent::StreamDelta(DeltaPayload::Text(text))
            }
            Some(Ok(DeltaFrame::PartialToolInput { json })) => {
                InboundEvent::StreamDelta(DeltaPayload::PartialToolInput(json))
            }
            _ => unrecognized(),
        },

        "block_start" => match serde_json::from_value::<BlockFrame>(value) {
            Ok(frame) => InboundEvent::BlockStart {
                kind: frame.block_kind,
            },
            Err(_) => unrecognized(),
        },

        "block_stop" => match serde_json::from_value::<BlockFrame>(value) {
            Ok(frame) => InboundEvent::BlockStop {
                kind: frame.block_kind,
            },
            Err(_) => unrecognized(),
        },

        "assistant_turn" => match serde_json::from_value::<AssistantTurnFrame>(value) {
            Ok(frame) => InboundEvent::AssistantTurn {
                text: frame.text,
                tool_invocations: frame
                    .tool_invocations
                    .into_iter()
                    .map(|inv| ToolInvocation {
                        id: inv.id,
                        name: inv.name,
                        input: inv.input,
                    })
                    .collect(),
            },
            Err(_) => unrecognized(),
        },

        "tool_results" => match serde_json::from_value::<ToolResultsFrame>(value) {
            Ok(frame) => InboundEvent::ToolResultBatch {
                results: frame
                    .results
                    .into_iter()
                    .map(|r| ToolResultPayload {
                        invocation_id: r.invocation_id,
                        content: r.content,
                        is_error: r.is_error,
                    })
                    .collect(),
            },
            Err(_) => unrecognized(),
        },

        "turn_result" => match value
            .get("outcome")
            .cloned()
            .map(serde_json::from_value::<OutcomeFrame>)
        {
            Some(Ok(OutcomeFrame::Success {
                duration_ms,
                cost_usd,
                usage,
            })) => InboundEvent::TurnResult(TurnOutcome::Success(TurnSuccess {
                duration_ms,
                cost_usd,
                usage: Usage {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                },
            })),
            Some(Ok(OutcomeFrame::Failure { error })) => {
                InboundEvent::TurnResult(TurnOutcome::Failure(TurnFailure { error }))
            }
            _ => unrecognized(),
        },

        "progress" => InboundEvent::ProgressNotice,

        _ => unrecognized(),
    }
}

/// Encode one outbound user message as a single line (without newline).
///
/// The message's own serialization already matches the wire field names;
/// this only adds the frame `type` tag.
pub fn encode_message(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(message)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "type".to_string(),
            Value::String("user_message".to_string()),
        );
    }
    serde_json::to_string(&value)
}

/// Encode the cancellation control frame.
pub fn encode_cancel() -> String {
    "{\"type\":\"cancel\"}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_domain::Role;

    #[test]
    fn decode_session_init() {
        let event = decode_line(r#"{"type":"session_init","sessionId":"sess-7"}"#).unwrap();
        assert!(matches!(
            event,
            InboundEvent::SessionInit { session_id } if session_id == "sess-7"
        ));
    }

    #[test]
    fn decode_text_delta() {
        let event =
            decode_line(r#"{"type":"delta","delta":{"kind":"text","text":"Hel"}}"#).unwrap();
        assert!(matches!(
            event,
            InboundEvent::StreamDelta(DeltaPayload::Text(text)) if text == "Hel"
        ));
    }

    #[test]
    fn decode_partial_tool_input_delta() {
        let event = decode_line(
            r#"{"type":"delta","delta":{"kind":"partialToolInput","json":"{\"pa"}}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            InboundEvent::StreamDelta(DeltaPayload::PartialToolInput(_))
        ));
    }

    #[test]
    fn decode_block_boundaries() {
        let start = decode_line(r#"{"type":"block_start","blockKind":"text"}"#).unwrap();
        let stop = decode_line(r#"{"type":"block_stop","blockKind":"text"}"#).unwrap();
        assert!(matches!(start, InboundEvent::BlockStart { kind } if kind == "text"));
        assert!(matches!(stop, InboundEvent::BlockStop { kind } if kind == "text"));
    }

    #[test]
    fn decode_assistant_turn_with_invocations() {
        let line = r#"{"type":"assistant_turn","text":"done","toolInvocations":[
            {"id":"t1","name":"read","input":{"path":"a.rs"}},
            {"id":"t2","name":"grep","input":{"pattern":"fn"}}
        ]}"#;
        let event = decode_line(line).unwrap();
        let InboundEvent::AssistantTurn {
            text,
            tool_invocations,
        } = event
        else {
            panic!("wrong variant");
        };
        assert_eq!(text.as_deref(), Some("done"));
        assert_eq!(tool_invocations.len(), 2);
        assert_eq!(tool_invocations[0].id, "t1");
        assert_eq!(tool_invocations[1].name, "grep");
    }

    #[test]
    fn decode_tool_results_batch() {
        let line = r#"{"type":"tool_results","results":[
            {"invocationId":"t2","content":"ok","isError":false},
            {"invocationId":"t1","content":"denied","isError":true}
        ]}"#;
        let event = decode_line(line).unwrap();
        let InboundEvent::ToolResultBatch { results } = event else {
            panic!("wrong variant");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].invocation_id, "t2");
        assert!(results[1].is_error);
    }

    #[test]
    fn decode_turn_result_success() {
        let line = r#"{"type":"turn_result","outcome":{"status":"success",
            "durationMs":1200,"costUsd":0.004,
            "usage":{"inputTokens":150,"outputTokens":80}}}"#;
        let event = decode_line(line).unwrap();
        let InboundEvent::TurnResult(TurnOutcome::Success(success)) = event else {
            panic!("wrong variant");
        };
        assert_eq!(success.duration_ms, 1200);
        assert_eq!(success.usage.output_tokens, 80);
    }

    #[test]
    fn decode_turn_result_failure() {
        let line = r#"{"type":"turn_result","outcome":{"status":"failure","error":"overloaded"}}"#;
        let event = decode_line(line).unwrap();
        assert!(matches!(
            event,
            InboundEvent::TurnResult(TurnOutcome::Failure(f)) if f.error == "overloaded"
        ));
    }

    #[test]
    fn unknown_tag_degrades_to_unrecognized() {
        let event = decode_line(r#"{"type":"v2_shiny_feature","stuff":[1,2,3]}"#).unwrap();
        assert!(matches!(
            event,
            InboundEvent::Unrecognized { tag } if tag == "v2_shiny_feature"
        ));
    }

    #[test]
    fn known_tag_with_bad_payload_degrades_to_unrecognized() {
        let event = decode_line(r#"{"type":"session_init"}"#).unwrap();
        assert!(matches!(event, InboundEvent::Unrecognized { .. }));
    }

    #[test]
    fn non_json_line_is_an_error() {
        assert!(decode_line("not json at all").is_err());
    }

    #[test]
    fn encode_user_message_camel_case() {
        let message = OutboundMessage::text("hello").with_session("sess-7");
        let line = encode_message(&message).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "user_message");
        assert_eq!(value["role"], "user");
        assert_eq!(value["sessionId"], "sess-7");
        assert_eq!(value["content"][0]["kind"], "text");
        assert_eq!(value["content"][0]["text"], "hello");
        assert_eq!(message.role, Role::User);
    }

    #[test]
    fn encode_omits_missing_session_id() {
        let line = encode_message(&OutboundMessage::text("hi")).unwrap();
        assert!(!line.contains("sessionId"));
    }
}
