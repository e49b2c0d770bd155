//! Typing signals and the per-conversation "who is typing" fold

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Ephemeral typing signal, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingSignal {
    pub conversation_id: Snowflake,
    pub user_id: Snowflake,
    pub username: String,
    pub avatar: Option<String>,
    pub is_typing: bool,
}

/// Current typers of one conversation, derived from the latest signal per user
///
/// Signals are folded last-write-wins by user id; ordering between users is
/// first-seen so the rendered sentence is stable while people keep typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingState {
    typers: Vec<TypingSignal>,
}

impl TypingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one signal into the state
    #[must_use]
    pub fn apply(mut self, signal: TypingSignal) -> Self {
        let existing = self.typers.iter().position(|t| t.user_id == signal.user_id);
        match (existing, signal.is_typing) {
            (Some(idx), true) => self.typers[idx] = signal,
            (Some(idx), false) => {
                self.typers.remove(idx);
            }
            (None, true) => self.typers.push(signal),
            (None, false) => {}
        }
        self
    }

    /// Fold a whole stream of signals
    pub fn from_signals(signals: impl IntoIterator<Item = TypingSignal>) -> Self {
        signals.into_iter().fold(Self::new(), Self::apply)
    }

    /// Names of everyone currently typing except `exclude`
    pub fn typers(&self, exclude: Option<Snowflake>) -> Vec<&str> {
        self.typers
            .iter()
            .filter(|t| Some(t.user_id) != exclude)
            .map(|t| t.username.as_str())
            .collect()
    }

    pub fn is_typing(&self, user_id: Snowflake) -> bool {
        self.typers.iter().any(|t| t.user_id == user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.typers.is_empty()
    }

    /// Indicator text for a viewer, `None` when nobody else is typing
    pub fn indicator(&self, viewer: Snowflake) -> Option<String> {
        describe_typers(&self.typers(Some(viewer)))
    }
}

/// Render the typing indicator sentence
pub fn describe_typers(names: &[&str]) -> Option<String> {
    match names {
        [] => None,
        [one] => Some(format!("{one} is typing")),
        [a, b] => Some(format!("{a} and {b} are typing")),
        [first, rest @ ..] => Some(format!("{first} and {} others are typing", rest.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(user: i64, name: &str, is_typing: bool) -> TypingSignal {
        TypingSignal {
            conversation_id: Snowflake::new(1),
            user_id: Snowflake::new(user),
            username: name.to_string(),
            avatar: None,
            is_typing,
        }
    }

    #[test]
    fn test_describe_typers() {
        assert_eq!(describe_typers(&[]), None);
        assert_eq!(describe_typers(&["Ana"]).unwrap(), "Ana is typing");
        assert_eq!(describe_typers(&["Ana", "Bo"]).unwrap(), "Ana and Bo are typing");
        assert_eq!(
            describe_typers(&["Ana", "Bo", "Cy"]).unwrap(),
            "Ana and 2 others are typing"
        );
        assert_eq!(
            describe_typers(&["Ana", "Bo", "Cy", "Di"]).unwrap(),
            "Ana and 3 others are typing"
        );
    }

    #[test]
    fn test_last_write_wins_per_user() {
        let state = TypingState::from_signals([
            signal(1, "Ana", true),
            signal(2, "Bo", true),
            signal(1, "Ana", false),
            signal(2, "Bo", true),
        ]);
        assert_eq!(state.typers(None), vec!["Bo"]);
        assert!(!state.is_typing(Snowflake::new(1)));
    }

    #[test]
    fn test_stop_for_unknown_user_is_ignored() {
        let state = TypingState::new().apply(signal(7, "Gus", false));
        assert!(state.is_empty());
    }

    #[test]
    fn test_indicator_excludes_viewer() {
        let state = TypingState::from_signals([
            signal(1, "Ana", true),
            signal(2, "Bo", true),
            signal(3, "Cy", true),
        ]);
        assert_eq!(state.indicator(Snowflake::new(4)).unwrap(), "Ana and 2 others are typing");
        assert_eq!(state.indicator(Snowflake::new(1)).unwrap(), "Bo and Cy are typing");
    }
}
