//! Decision Engine
//!
//! Stateless. Turns a purpose and its options into clarification questions,
//! then turns purpose, options and answers into a decision. Owns prompt
//! wording and reply parsing so callers never see the model's raw text.
//!
//! Provider failures propagate. Unparsable replies do not: they are logged
//! and replaced by an empty question list or `Decision::unparsable()`.

use crate::error::{ExtractError, ProviderError};
use crate::extract::{extract_json_array, extract_json_object};
use crate::prompts;
use crate::provider::CompletionProvider;
use crate::types::{Answers, ClarificationQuestion, Decision};
use serde_json::Value;
use std::sync::Arc;

/// How much to trust the model's choice of option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecisionStrictness {
    /// Return whatever the model named
    #[default]
    Lenient,
    /// The decision must name one of the listed options
    Strict,
}

pub struct DecisionEngine {
    provider: Arc<dyn CompletionProvider>,
    strictness: DecisionStrictness,
}

impl DecisionEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            strictness: DecisionStrictness::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: DecisionStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn strictness(&self) -> DecisionStrictness {
        self.strictness
    }

    /// Ask the model for 2-3 clarification questions.
    ///
    /// An empty result means the reply held nothing usable.
    pub async fn generate_questions(
        &self,
        purpose: &str,
        options: &[String],
    ) -> Result<Vec<ClarificationQuestion>, ProviderError> {
        let prompt = prompts::questions_prompt(purpose, options);
        tracing::debug!(prompt_len = prompt.len(), model = self.provider.model(), "requesting questions");

        let reply = self.provider.complete(&prompt).await?;
        match parse_questions(&reply) {
            Ok(questions) => {
                tracing::info!(count = questions.len(), "clarification questions generated");
                Ok(questions)
            }
            Err(e) => {
                tracing::warn!(error = %e, reply_len = reply.len(), "unparsable questions reply");
                Ok(Vec::new())
            }
        }
    }

    /// Ask the model to pick the best option and justify it
    pub async fn get_final_decision(
        &self,
        purpose: &str,
        options: &[String],
        answers: &Answers,
    ) -> Result<Decision, ProviderError> {
        let prompt = prompts::decision_prompt(purpose, options, answers);
        tracing::debug!(
            prompt_len = prompt.len(),
            answers = answers.len(),
            model = self.provider.model(),
            "requesting decision"
        );

        let reply = self.provider.complete(&prompt).await?;
        let decision = match parse_decision(&reply) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(error = %e, reply_len = reply.len(), "unparsable decision reply");
                return Ok(Decision::unparsable());
            }
        };

        Ok(match self.strictness {
            DecisionStrictness::Lenient => decision,
            DecisionStrictness::Strict => enforce_listed(decision, options),
        })
    }
}

/// Read question-shaped entries out of a reply.
///
/// Every object is kept with its fields coerced to text. Only entries that
/// are not objects are skipped.
pub fn parse_questions(reply: &str) -> Result<Vec<ClarificationQuestion>, ExtractError> {
    let values = extract_json_array(reply)?;
    let total = values.len();
    let questions: Vec<ClarificationQuestion> = values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value::<ClarificationQuestion>(v).ok())
        .collect();
    if questions.len() < total {
        tracing::debug!(skipped = total - questions.len(), "skipped malformed question entries");
    }
    Ok(questions)
}

/// Read a `{decision, reason}` object out of a reply
pub fn parse_decision(reply: &str) -> Result<Decision, ExtractError> {
    let object = extract_json_object(reply)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Match the decision to a listed option, ignoring case and padding
fn enforce_listed(decision: Decision, options: &[String]) -> Decision {
    let chosen = decision.decision.trim();
    let folded = chosen.to_lowercase();
    match options.iter().find(|o| o.trim().to_lowercase() == folded) {
        Some(option) => Decision {
            decision: option.clone(),
            reason: decision.reason,
        },
        None => {
            tracing::warn!(chosen = %chosen, "decision names an option that was not offered");
            Decision::new(
                Decision::UNKNOWN,
                format!(
                    "The model chose \"{}\", which is not one of the listed options.",
                    chosen
                ),
            )
        }
    }
}
