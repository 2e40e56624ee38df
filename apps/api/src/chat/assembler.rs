//! Prompt assembly — turns a message, history and grounding into the ordered
//! turn list every backend receives.

use crate::chat::prompts::{MATCHING_JOBS_HEADER, NO_MATCHING_JOBS, PERSONA_SYSTEM};
use crate::models::conversation::{AssembledPrompt, ConversationTurn};

/// Number of most recent history turns kept in the prompt.
pub const HISTORY_WINDOW: usize = 5;

/// Builds the prompt: persona, exactly one grounding turn, the last
/// `HISTORY_WINDOW` history turns in original order, then the message as the
/// final user turn. Pure and deterministic.
pub fn build_prompt(
    message: &str,
    history: &[ConversationTurn],
    grounding: &[String],
) -> AssembledPrompt {
    let retained = recent_history(history);

    let mut turns = Vec::with_capacity(retained.len() + 3);
    turns.push(ConversationTurn::system(PERSONA_SYSTEM));
    turns.push(grounding_turn(grounding));
    turns.extend(retained.iter().cloned());
    turns.push(ConversationTurn::user(message));

    AssembledPrompt::from_turns(turns)
}

/// The trailing `HISTORY_WINDOW` turns; earlier turns are dropped.
pub fn recent_history(history: &[ConversationTurn]) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

fn grounding_turn(grounding: &[String]) -> ConversationTurn {
    if grounding.is_empty() {
        return ConversationTurn::system(NO_MATCHING_JOBS);
    }
    let jobs = grounding
        .iter()
        .map(|job| format!("- {job}"))
        .collect::<Vec<_>>()
        .join("\n");
    ConversationTurn::system(format!("{MATCHING_JOBS_HEADER}\n{jobs}"))
}
