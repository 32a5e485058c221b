//! Core types for DilemmAI
//!
//! The whole interaction is one `Dilemma` moving through three stages:
//! - Input: the user states a purpose and at least two options
//! - Questions: the model asks a few clarification questions
//! - Final: the model picks an option and explains why

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The point a dilemma has reached in the flow
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Collecting purpose and options
    #[default]
    Input,
    /// Answering clarification questions
    Questions,
    /// Decision made
    Final,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Questions => "questions",
            Stage::Final => "final",
        }
    }

    /// The only stage reachable from this one by `advance`
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Input => Some(Stage::Questions),
            Stage::Questions => Some(Stage::Final),
            Stage::Final => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An AI-generated question with a bounded set of answer choices
///
/// Both fields default when the model leaves them out or sends `null`, so a
/// half-formed entry still renders as a question with no choices. Numbers
/// and booleans are shown as written (`"options": [1, 2, 4]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClarificationQuestion {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_choices")]
    pub options: Vec<String>,
}

/// Render any JSON value as display text; `null` is empty
fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn lenient_choices<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(value_text)
            .collect(),
        single => vec![value_text(single)],
    })
}

impl ClarificationQuestion {
    pub fn new(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// The final chosen option plus its justification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub decision: String,
    pub reason: String,
}

impl Decision {
    pub const UNKNOWN: &'static str = "Unknown";
    pub const UNPARSABLE_REASON: &'static str = "Could not parse the response.";

    pub fn new(decision: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            reason: reason.into(),
        }
    }

    /// Returned when no decision object could be read from the model reply
    pub fn unparsable() -> Self {
        Self::new(Self::UNKNOWN, Self::UNPARSABLE_REASON)
    }

    pub fn is_unknown(&self) -> bool {
        self.decision == Self::UNKNOWN
    }
}

/// One recorded answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub choice: String,
}

/// Question text -> chosen option, iterated in the order answers were first given
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Answers(Vec<Answer>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced answer keeps its original position.
    ///
    /// Returns true when the stored value changed.
    pub fn upsert(&mut self, question: &str, choice: &str) -> bool {
        match self.0.iter_mut().find(|a| a.question == question) {
            Some(existing) if existing.choice == choice => false,
            Some(existing) => {
                existing.choice = choice.to_string();
                true
            }
            None => {
                self.0.push(Answer {
                    question: question.to_string(),
                    choice: choice.to_string(),
                });
                true
            }
        }
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.question == question)
            .map(|a| a.choice.as_str())
    }

    pub fn contains(&self, question: &str) -> bool {
        self.get(question).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|a| (a.question.as_str(), a.choice.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<Q: Into<String>, C: Into<String>> FromIterator<(Q, C)> for Answers {
    fn from_iter<I: IntoIterator<Item = (Q, C)>>(iter: I) -> Self {
        let mut answers = Answers::new();
        for (q, c) in iter {
            let (q, c) = (q.into(), c.into());
            answers.upsert(&q, &c);
        }
        answers
    }
}

/// The per-session record of purpose, options, questions, answers and decision
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dilemma {
    pub stage: Stage,
    pub purpose: String,
    pub options: Vec<String>,
    pub questions: Vec<ClarificationQuestion>,
    pub answers: Answers,
    pub decision: Option<Decision>,
}

impl Dilemma {
    /// Questions that have no recorded answer yet, in question order
    pub fn unanswered(&self) -> Vec<&str> {
        self.questions
            .iter()
            .map(|q| q.text.as_str())
            .filter(|text| !self.answers.contains(text))
            .collect()
    }

    pub fn question(&self, text: &str) -> Option<&ClarificationQuestion> {
        self.questions.iter().find(|q| q.text == text)
    }
}

/// What a state operation changed, so the presentation knows what to redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The operation was a no-op
    None,
    Purpose,
    Options,
    Questions,
    Answers,
    Decision,
    Stage { from: Stage, to: Stage },
    /// Everything was cleared
    Reset,
}

impl Change {
    pub fn is_none(&self) -> bool {
        matches!(self, Change::None)
    }
}
