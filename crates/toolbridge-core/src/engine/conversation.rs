//! Append-only conversation log

use crate::types::{AssistantReply, ConversationMessage};

/// Length marker taken before a turn, used to undo it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Ordered history of one session
///
/// Messages are only ever appended. The log shrinks through [`reset`] or
/// by rolling a failed turn back to its [`Checkpoint`].
///
/// [`reset`]: Conversation::reset
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ConversationMessage) {
        debug_assert!(
            !matches!(message, ConversationMessage::Tool { ref call_id, .. } if !self.has_pending_call(call_id)),
            "tool result without a matching tool call"
        );
        self.messages.push(message);
    }

    /// The history in order
    pub fn snapshot(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Clear the whole history
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.messages.len())
    }

    /// Drop everything appended since `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.messages.truncate(checkpoint.0);
    }

    /// Whether the most recent assistant message requested `call_id`
    fn has_pending_call(&self, call_id: &str) -> bool {
        let last_assistant = self
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m, ConversationMessage::Assistant { .. }));
        match last_assistant {
            Some(ConversationMessage::Assistant {
                reply: AssistantReply::ToolRequests { calls },
            }) => calls.iter().any(|c| c.id == call_id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolOutcome, ToolRequest};

    #[test]
    fn test_append_and_reset() {
        let mut conversation = Conversation::new();
        conversation.append(ConversationMessage::user("hello"));
        conversation.append(ConversationMessage::assistant(AssistantReply::FinalText {
            text: "hi there".to_string(),
        }));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.snapshot()[0].text(), Some("hello"));

        conversation.reset();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_rollback_drops_partial_turn() {
        let mut conversation = Conversation::new();
        conversation.append(ConversationMessage::user("first"));
        let checkpoint = conversation.checkpoint();

        let call = ToolRequest::new("c1", "a__x", "{}");
        conversation.append(ConversationMessage::user("second"));
        conversation.append(ConversationMessage::assistant(AssistantReply::ToolRequests {
            calls: vec![call.clone()],
        }));
        conversation.append(ConversationMessage::tool(&call, ToolOutcome::success("ok")));

        conversation.rollback(checkpoint);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last().and_then(|m| m.text()), Some("first"));
    }

    #[test]
    fn test_tool_results_answer_the_latest_request() {
        let mut conversation = Conversation::new();
        let first = ToolRequest::new("c1", "a__x", "{}");
        let second = ToolRequest::new("c2", "a__y", "{}");
        conversation.append(ConversationMessage::user("go"));
        conversation.append(ConversationMessage::assistant(AssistantReply::ToolRequests {
            calls: vec![first.clone()],
        }));
        conversation.append(ConversationMessage::tool(&first, ToolOutcome::success("one")));
        conversation.append(ConversationMessage::assistant(AssistantReply::ToolRequests {
            calls: vec![second.clone()],
        }));

        assert!(conversation.has_pending_call("c2"));
        assert!(!conversation.has_pending_call("c1"));
        assert!(!conversation.has_pending_call("c3"));
    }

    #[test]
    #[should_panic(expected = "tool result without a matching tool call")]
    #[cfg(debug_assertions)]
    fn test_stale_tool_result_is_rejected() {
        let mut conversation = Conversation::new();
        let first = ToolRequest::new("c1", "a__x", "{}");
        conversation.append(ConversationMessage::assistant(AssistantReply::ToolRequests {
            calls: vec![first.clone()],
        }));
        conversation.append(ConversationMessage::tool(&first, ToolOutcome::success("one")));
        conversation.append(ConversationMessage::assistant(AssistantReply::FinalText {
            text: "done".to_string(),
        }));

        conversation.append(ConversationMessage::tool(&first, ToolOutcome::success("late")));
    }
}
