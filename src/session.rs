//! Session state
//!
//! Owns one user's `Dilemma` and gates every mutation on the current stage.
//! Purpose and options can only change during Input, answers only during
//! Questions, and `advance` only moves forward one stage at a time once its
//! precondition holds. A rejected operation leaves the dilemma untouched.

use crate::error::ValidationFailure;
use crate::types::{ClarificationQuestion, Change, Decision, Dilemma, Stage};

/// Fewest options a dilemma needs before questions can be generated
pub const MIN_OPTIONS: usize = 2;

/// Which option to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionRef {
    Value(String),
    Index(usize),
}

impl From<&str> for OptionRef {
    fn from(value: &str) -> Self {
        OptionRef::Value(value.to_string())
    }
}

impl From<usize> for OptionRef {
    fn from(index: usize) -> Self {
        OptionRef::Index(index)
    }
}

/// Trim surrounding whitespace and any trailing commas
pub fn normalize_option(value: &str) -> &str {
    value
        .trim()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
}

/// The mutable record of one in-progress dilemma
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    dilemma: Option<Dilemma>,
}

impl SessionState {
    /// An uninitialized session. Call `initialize` before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the dilemma with defaults if it does not exist yet.
    ///
    /// Never touches an existing dilemma, so it is safe on every redraw.
    pub fn initialize(&mut self) -> &mut Dilemma {
        self.dilemma.get_or_insert_with(Dilemma::default)
    }

    pub fn is_initialized(&self) -> bool {
        self.dilemma.is_some()
    }

    /// Read access. An uninitialized session reads as a fresh dilemma.
    pub fn dilemma(&self) -> &Dilemma {
        static EMPTY: std::sync::OnceLock<Dilemma> = std::sync::OnceLock::new();
        self.dilemma
            .as_ref()
            .unwrap_or_else(|| EMPTY.get_or_init(Dilemma::default))
    }

    pub fn stage(&self) -> Stage {
        self.dilemma().stage
    }

    fn require_stage(&mut self, stage: Stage, action: &'static str) -> Result<&mut Dilemma, ValidationFailure> {
        let dilemma = self.initialize();
        if dilemma.stage != stage {
            return Err(ValidationFailure::StageLocked {
                stage: dilemma.stage,
                action,
            });
        }
        Ok(dilemma)
    }

    // ========================================================================
    // Input stage
    // ========================================================================

    pub fn set_purpose(&mut self, purpose: &str) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Input, "change the question")?;
        let purpose = purpose.trim();
        if dilemma.purpose == purpose {
            return Ok(Change::None);
        }
        dilemma.purpose = purpose.to_string();
        Ok(Change::Purpose)
    }

    /// Append an option after normalizing it.
    ///
    /// Empty or already-present values are a no-op.
    pub fn add_option(&mut self, value: &str) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Input, "edit options")?;
        let value = normalize_option(value);
        if value.is_empty() || dilemma.options.iter().any(|o| o == value) {
            return Ok(Change::None);
        }
        dilemma.options.push(value.to_string());
        Ok(Change::Options)
    }

    pub fn remove_option(&mut self, target: impl Into<OptionRef>) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Input, "edit options")?;
        let index = match target.into() {
            OptionRef::Index(i) if i < dilemma.options.len() => Some(i),
            OptionRef::Index(_) => None,
            OptionRef::Value(v) => dilemma.options.iter().position(|o| *o == v),
        };
        match index {
            Some(i) => {
                dilemma.options.remove(i);
                Ok(Change::Options)
            }
            None => Ok(Change::None),
        }
    }

    /// Store generated questions. Any earlier answers are dropped.
    pub fn store_questions(
        &mut self,
        questions: Vec<ClarificationQuestion>,
    ) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Input, "store questions")?;
        dilemma.questions = questions;
        dilemma.answers.clear();
        Ok(Change::Questions)
    }

    // ========================================================================
    // Questions stage
    // ========================================================================

    /// Upsert an answer.
    ///
    /// The question must be one of the stored questions. Keeping `choice`
    /// within that question's options is left to the caller.
    pub fn record_answer(&mut self, question: &str, choice: &str) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Questions, "answer questions")?;
        if dilemma.question(question).is_none() {
            return Err(ValidationFailure::UnknownQuestion(question.to_string()));
        }
        if dilemma.answers.upsert(question, choice) {
            Ok(Change::Answers)
        } else {
            Ok(Change::None)
        }
    }

    pub fn store_decision(&mut self, decision: Decision) -> Result<Change, ValidationFailure> {
        let dilemma = self.require_stage(Stage::Questions, "store a decision")?;
        dilemma.decision = Some(decision);
        Ok(Change::Decision)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Check whether `advance(next)` would succeed, without changing anything
    pub fn check_advance(&self, next: Stage) -> Result<(), ValidationFailure> {
        let dilemma = self.dilemma();
        let from = dilemma.stage;
        if from.next() != Some(next) {
            return Err(ValidationFailure::InvalidTransition { from, to: next });
        }

        match next {
            Stage::Questions => {
                if dilemma.purpose.trim().is_empty() {
                    return Err(ValidationFailure::EmptyPurpose);
                }
                if dilemma.options.len() < MIN_OPTIONS {
                    return Err(ValidationFailure::TooFewOptions {
                        count: dilemma.options.len(),
                    });
                }
            }
            Stage::Final => {
                let missing: Vec<String> =
                    dilemma.unanswered().into_iter().map(String::from).collect();
                if !missing.is_empty() {
                    return Err(ValidationFailure::Unanswered { missing });
                }
            }
            Stage::Input => {}
        }
        Ok(())
    }

    /// Move forward one stage if the precondition holds
    pub fn advance(&mut self, next: Stage) -> Result<Change, ValidationFailure> {
        self.check_advance(next)?;
        let dilemma = self.initialize();
        let from = dilemma.stage;
        dilemma.stage = next;
        tracing::debug!(%from, to = %next, "stage advanced");
        Ok(Change::Stage { from, to: next })
    }

    /// Clear everything and return to Input
    pub fn reset(&mut self) -> Change {
        self.dilemma = Some(Dilemma::default());
        Change::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn question(text: &str) -> ClarificationQuestion {
        ClarificationQuestion::new(text, vec!["Yes".into(), "No".into()])
    }

    fn ready_session() -> SessionState {
        let mut state = SessionState::new();
        state.initialize();
        state.set_purpose("Where should we travel?").unwrap();
        state.add_option("Mountains").unwrap();
        state.add_option("Beach").unwrap();
        state
    }

    #[test]
    fn test_normalize_option() {
        assert_eq!(normalize_option("  Pizza, "), "Pizza");
        assert_eq!(normalize_option("Sushi,,"), "Sushi");
        assert_eq!(normalize_option("Tacos , ,"), "Tacos");
        assert_eq!(normalize_option(" , "), "");
        assert_eq!(normalize_option("Salt, pepper"), "Salt, pepper");
    }

    #[test]
    fn test_add_option_dedupes_and_orders() {
        let mut state = SessionState::new();
        state.initialize();

        assert_eq!(state.add_option("Pizza").unwrap(), Change::Options);
        assert_eq!(state.add_option("Sushi,").unwrap(), Change::Options);
        assert_eq!(state.add_option(" Pizza ").unwrap(), Change::None);
        assert_eq!(state.add_option("   ").unwrap(), Change::None);

        assert_eq!(state.dilemma().options, vec!["Pizza", "Sushi"]);
    }

    #[test]
    fn test_remove_option() {
        let mut state = ready_session();
        state.add_option("City").unwrap();

        assert_eq!(state.remove_option("Beach").unwrap(), Change::Options);
        assert_eq!(state.remove_option("Beach").unwrap(), Change::None);
        assert_eq!(state.remove_option(5usize).unwrap(), Change::None);
        assert_eq!(state.remove_option(0usize).unwrap(), Change::Options);

        assert_eq!(state.dilemma().options, vec!["City"]);
    }

    #[test]
    fn test_advance_requires_purpose() {
        let mut state = SessionState::new();
        state.initialize();
        state.add_option("A").unwrap();
        state.add_option("B").unwrap();

        assert_eq!(
            state.advance(Stage::Questions),
            Err(ValidationFailure::EmptyPurpose)
        );
        assert_eq!(state.stage(), Stage::Input);
    }

    #[test]
    fn test_advance_requires_two_options() {
        let mut state = SessionState::new();
        state.initialize();
        state.set_purpose("Lunch?").unwrap();
        state.add_option("Soup").unwrap();

        assert_eq!(
            state.advance(Stage::Questions),
            Err(ValidationFailure::TooFewOptions { count: 1 })
        );
        assert_eq!(state.stage(), Stage::Input);
    }

    #[test]
    fn test_advance_keeps_purpose_and_options() {
        let mut state = ready_session();
        let before = state.dilemma().clone();

        let change = state.advance(Stage::Questions).unwrap();

        assert_eq!(
            change,
            Change::Stage {
                from: Stage::Input,
                to: Stage::Questions
            }
        );
        assert_eq!(state.dilemma().purpose, before.purpose);
        assert_eq!(state.dilemma().options, before.options);
    }

    #[test]
    fn test_cannot_skip_or_go_back() {
        let mut state = ready_session();
        assert_eq!(
            state.advance(Stage::Final),
            Err(ValidationFailure::InvalidTransition {
                from: Stage::Input,
                to: Stage::Final
            })
        );
        state.advance(Stage::Questions).unwrap();
        assert!(matches!(
            state.advance(Stage::Input),
            Err(ValidationFailure::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_options_locked_after_input() {
        let mut state = ready_session();
        state.advance(Stage::Questions).unwrap();

        assert!(matches!(
            state.add_option("City"),
            Err(ValidationFailure::StageLocked { stage: Stage::Questions, .. })
        ));
        assert!(state.set_purpose("Something else").is_err());
        assert_eq!(state.dilemma().options.len(), 2);
    }

    #[test]
    fn test_final_requires_all_answers() {
        let mut state = ready_session();
        state
            .store_questions(vec![question("Budget?"), question("Hiking?")])
            .unwrap();
        state.advance(Stage::Questions).unwrap();
        state.record_answer("Budget?", "Yes").unwrap();

        assert_eq!(
            state.advance(Stage::Final),
            Err(ValidationFailure::Unanswered {
                missing: vec!["Hiking?".to_string()]
            })
        );

        state.record_answer("Hiking?", "No").unwrap();
        assert!(state.advance(Stage::Final).is_ok());
    }

    #[test]
    fn test_no_questions_means_no_clarification_needed() {
        let mut state = ready_session();
        state.store_questions(Vec::new()).unwrap();
        state.advance(Stage::Questions).unwrap();
        assert!(state.check_advance(Stage::Final).is_ok());
    }

    #[test]
    fn test_record_answer_unknown_question() {
        let mut state = ready_session();
        state.store_questions(vec![question("Budget?")]).unwrap();
        state.advance(Stage::Questions).unwrap();

        assert_eq!(
            state.record_answer("Weather?", "Yes"),
            Err(ValidationFailure::UnknownQuestion("Weather?".into()))
        );
        assert_eq!(state.record_answer("Budget?", "Yes").unwrap(), Change::Answers);
        assert_eq!(state.record_answer("Budget?", "Yes").unwrap(), Change::None);
    }

    #[test]
    fn test_store_questions_clears_answers() {
        let mut state = SessionState::new();
        let dilemma = state.initialize();
        dilemma.answers.upsert("old", "answer");

        state.store_questions(vec![question("New?")]).unwrap();
        assert!(state.dilemma().answers.is_empty());
    }

    #[test]
    fn test_reset_then_initialize_is_fresh() {
        let mut state = ready_session();
        state.store_questions(vec![question("Budget?")]).unwrap();
        state.advance(Stage::Questions).unwrap();
        state.record_answer("Budget?", "Yes").unwrap();
        state.store_decision(Decision::new("Beach", "Warm")).unwrap();
        state.advance(Stage::Final).unwrap();

        assert_eq!(state.reset(), Change::Reset);
        state.initialize();

        let mut fresh = SessionState::new();
        fresh.initialize();
        assert_eq!(state.dilemma(), fresh.dilemma());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut state = ready_session();
        let before = state.dilemma().clone();

        state.initialize();
        state.initialize();

        assert_eq!(state.dilemma(), &before);
    }

    #[test]
    fn test_uninitialized_reads_as_default() {
        let state = SessionState::new();
        assert!(!state.is_initialized());
        assert_eq!(state.dilemma(), &Dilemma::default());
        assert_eq!(state.stage(), Stage::Input);
    }

    proptest! {
        #[test]
        fn prop_options_unique_in_first_seen_order(values in proptest::collection::vec("[ a-c,]{0,4}", 0..20)) {
            let mut state = SessionState::new();
            state.initialize();
            for v in &values {
                state.add_option(v).unwrap();
            }

            let mut expected: Vec<String> = Vec::new();
            for v in &values {
                let n = normalize_option(v);
                if !n.is_empty() && !expected.iter().any(|e| e == n) {
                    expected.push(n.to_string());
                }
            }

            let options = &state.dilemma().options;
            prop_assert_eq!(options, &expected);
            for (i, a) in options.iter().enumerate() {
                prop_assert!(!a.is_empty());
                prop_assert!(options[i + 1..].iter().all(|b| b != a));
            }
        }
    }
}
