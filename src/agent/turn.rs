//! Turn state tracking
//!
//! Tracks where an assistant is within a turn and what every delegation
//! produced along the way.

use serde::{Deserialize, Serialize};

/// Phase of a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No model call pending
    #[default]
    Idle,
    /// Waiting on the outer model call
    AwaitingModel,
    /// A delegation tool call is being served
    Delegating,
    /// Final text received, being delivered and persisted
    Responded,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "idle"),
            TurnPhase::AwaitingModel => write!(f, "awaiting_model"),
            TurnPhase::Delegating => write!(f, "delegating"),
            TurnPhase::Responded => write!(f, "responded"),
        }
    }
}

/// State of the current (or last) turn
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    pub phase: TurnPhase,
    /// Delegations served during the turn, in call order
    pub delegations: Vec<DelegationRecord>,
}

impl TurnState {
    /// Start a new turn, forgetting the previous one
    pub fn begin(&mut self) {
        self.phase = TurnPhase::AwaitingModel;
        self.delegations.clear();
    }

    pub fn enter_delegation(&mut self) {
        self.phase = TurnPhase::Delegating;
    }

    /// Record a finished delegation and resume waiting on the model
    pub fn finish_delegation(&mut self, record: DelegationRecord) {
        self.delegations.push(record);
        self.phase = TurnPhase::AwaitingModel;
    }

    pub fn respond(&mut self) {
        self.phase = TurnPhase::Responded;
    }

    pub fn reset(&mut self) {
        self.phase = TurnPhase::Idle;
    }

    pub fn failed_delegations(&self) -> usize {
        self.delegations.iter().filter(|d| !d.success).count()
    }
}

/// Outcome of one delegation tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    /// Requested subagent id (may be unknown)
    pub subagent_id: String,
    /// Whether the subagent produced an answer
    pub success: bool,
    /// Text returned to the model as the tool result
    pub output: String,
}

impl DelegationRecord {
    pub fn success(subagent_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            subagent_id: subagent_id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(subagent_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            subagent_id: subagent_id.into(),
            success: false,
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_state_new() {
        let state = TurnState::default();
        assert_eq!(state.phase, TurnPhase::Idle);
        assert!(state.delegations.is_empty());
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = TurnState::default();
        state.begin();
        assert_eq!(state.phase, TurnPhase::AwaitingModel);

        state.enter_delegation();
        assert_eq!(state.phase, TurnPhase::Delegating);

        state.finish_delegation(DelegationRecord::failure("coder", "not found"));
        assert_eq!(state.phase, TurnPhase::AwaitingModel);
        assert_eq!(state.failed_delegations(), 1);

        state.respond();
        assert_eq!(state.phase.to_string(), "responded");
        state.reset();
        assert_eq!(state.phase, TurnPhase::Idle);
    }

    #[test]
    fn test_begin_clears_previous_delegations() {
        let mut state = TurnState::default();
        state.finish_delegation(DelegationRecord::success("programmer", "done"));
        state.begin();
        assert!(state.delegations.is_empty());
    }
}
