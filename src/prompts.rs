//! Prompt construction for the decision engine

use crate::types::Answers;

/// Ask for 2-3 clarification questions as a JSON array
pub fn questions_prompt(purpose: &str, options: &[String]) -> String {
    format!(
        r#"You are a helpful AI in a smart decision-making app.
The user wants to decide: "{purpose}"
Their options: {options}

Generate 2-3 short clarification questions with 2-4 answer options each.
Return only a JSON array in this format:
[
  {{
    "text": "Your question?",
    "options": ["Option A", "Option B"]
  }}
]
"#,
        purpose = purpose,
        options = options.join(", "),
    )
}

/// Ask for the best option and a reason as a single JSON object
pub fn decision_prompt(purpose: &str, options: &[String], answers: &Answers) -> String {
    let answer_lines = answers
        .iter()
        .enumerate()
        .map(|(i, (q, a))| format!("Q{}: {}\nA: {}", i + 1, q, a))
        .collect::<Vec<_>>()
        .join("\n\n");

    let answer_block = if answer_lines.is_empty() {
        "(no clarification was needed)".to_string()
    } else {
        answer_lines
    };

    format!(
        r#"You are a smart assistant that helps users make decisions.
Main question: "{purpose}"
Options: {options}
User's answers:
{answers}

Choose the best option from the list above and explain why.
Return only a JSON object in this format:
{{
  "decision": "Best option",
  "reason": "Explanation"
}}
"#,
        purpose = purpose,
        options = options.join(", "),
        answers = answer_block,
    )
}
