//! Agent module - orchestration and conversation management
//!
//! Contains the assistant that runs turns against the model provider and
//! delegates sub-tasks to specialised subagents.

pub mod conversation;
pub mod delegation;
pub mod orchestrator;
pub mod prompts;
pub mod sink;
pub mod sub_agent;
pub mod turn;

pub use conversation::{Conversation, ConversationRecord};
pub use delegation::{DelegationTool, DELEGATE_TOOL_NAME};
pub use orchestrator::Assistant;
pub use sink::{Discard, ResponseSink};
pub use sub_agent::{SubAgent, SubAgentRegistry};
pub use turn::{DelegationRecord, TurnPhase, TurnState};
