//! Built-in assistant persona

use crate::agent::delegation::DELEGATE_TOOL_NAME;
use crate::agent::sub_agent::SubAgentRegistry;

const PERSONA: &str = "\
Your name is Agent.
You are a highly skilled and helpful coworker for a software development company.

Your task is to communicate with the user and help them with their tasks.
You should ask users questions to understand their needs and to resolve uncertainties.
You should also call sub-agents (other coworkers) that will help you with the task. Each one has its own specialization.

You will communicate with the agents and the user, serving as a mediator.";

/// Instructions for the outer model, naming every available subagent
pub fn assistant_instructions(subagents: &SubAgentRegistry) -> String {
    let mut prompt = String::from(PERSONA);

    if subagents.is_empty() {
        return prompt;
    }

    prompt.push_str(&format!(
        "\n\nUse the `{}` tool to hand work to one of these sub-agents:\n",
        DELEGATE_TOOL_NAME
    ));
    for agent in subagents.agents() {
        prompt.push_str(&format!("- `{}`: {}\n", agent.id, agent.name));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::sub_agent::SubAgent;

    #[test]
    fn test_instructions_list_subagents() {
        let registry = SubAgentRegistry::from_agents(vec![SubAgent::new(
            "programmer",
            "Programmer",
            "m",
            "p",
        )]);

        let prompt = assistant_instructions(&registry);
        assert!(prompt.starts_with("Your name is Agent."));
        assert!(prompt.contains("- `programmer`: Programmer"));
    }

    #[test]
    fn test_instructions_without_subagents() {
        let prompt = assistant_instructions(&SubAgentRegistry::default());
        assert!(!prompt.contains(DELEGATE_TOOL_NAME));
    }
}
