//! Stream events emitted during analysis and discussion.
//!
//! Events serialize as tagged JSON records (`{"type": ..., "content": ...}`)
//! for a thin transport layer (SSE, websockets) to forward verbatim. Every
//! stream, success or failure, ends with exactly one `done` sentinel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the `analysis_complete` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCompleted {
    pub analysis_id: Uuid,
    pub veracity_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    /// Discussion thread created for follow-up questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_conversation_id: Option<Uuid>,
}

/// Progress events streamed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Human-readable progress line.
    Status { content: String },

    /// One chunk of streamed model output. During discussion streaming the
    /// chunk is tagged with the placeholder message it belongs to.
    Content {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<Uuid>,
    },

    /// The analysis reached `completed`.
    AnalysisComplete { content: AnalysisCompleted },

    /// A streamed bot message was fully persisted.
    MessageComplete { message_id: Uuid },

    /// Terminal failure; always followed by the `done` sentinel.
    Error { content: String },

    /// Stream termination sentinel, emitted exactly once per stream.
    Done,
}

impl StreamEvent {
    /// Shorthand for a status event.
    pub fn status(content: impl Into<String>) -> Self {
        Self::Status {
            content: content.into(),
        }
    }

    /// Shorthand for an untagged content chunk.
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
            message_id: None,
        }
    }

    /// Shorthand for an error event.
    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(StreamEvent::status("Analyzing claim...")).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["content"], "Analyzing claim...");

        let json = serde_json::to_value(StreamEvent::Done).unwrap();
        assert_eq!(json["type"], "done");
    }

    #[test]
    fn content_event_omits_absent_message_id() {
        let json = serde_json::to_value(StreamEvent::content("chunk")).unwrap();
        assert!(json.get("message_id").is_none());

        let id = Uuid::new_v4();
        let json = serde_json::to_value(StreamEvent::Content {
            content: "chunk".into(),
            message_id: Some(id),
        })
        .unwrap();
        assert_eq!(json["message_id"], id.to_string());
    }

    #[test]
    fn analysis_complete_round_trips() {
        let event = StreamEvent::AnalysisComplete {
            content: AnalysisCompleted {
                analysis_id: Uuid::new_v4(),
                veracity_score: 0.42,
                confidence_score: Some(0.9),
                conversation_id: None,
                claim_conversation_id: None,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
