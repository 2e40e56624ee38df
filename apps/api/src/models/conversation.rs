use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single turn of a conversation. History entries missing a role are
/// treated as user turns; missing content is treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The full, backend-agnostic context submitted for generation.
///
/// Layout: persona system turn, one grounding system turn, the retained
/// history, then exactly one trailing user turn carrying the current message.
/// Only the prompt assembler constructs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    turns: Vec<ConversationTurn>,
}

impl AssembledPrompt {
    pub(crate) fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        debug_assert!(matches!(turns.last(), Some(t) if t.role == Role::User));
        Self { turns }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// The trailing user turn.
    #[cfg(test)]
    pub fn current_message(&self) -> &str {
        self.turns
            .last()
            .map(|t| t.content.as_str())
            .unwrap_or_default()
    }

    /// Total characters across all turns, for logging.
    pub fn char_count(&self) -> usize {
        self.turns.iter().map(|t| t.content.chars().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        let role: Role = serde_json::from_str(r#""assistant""#).unwrap();
        assert_eq!(role, Role::Assistant);
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
    }

    #[test]
    fn test_turn_missing_fields_default_to_empty_user() {
        let turn: ConversationTurn = serde_json::from_str("{}").unwrap();
        assert_eq!(turn.role, Role::User);
        assert!(turn.content.is_empty());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<ConversationTurn, _> =
            serde_json::from_str(r#"{"role": "tool", "content": "x"}"#);
        assert!(result.is_err());
    }
}
