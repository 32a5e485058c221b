//! Dilemma flow
//!
//! `DilemmaSession` is the layer the presentation talks to. It owns one
//! `SessionState`, runs the engine at the two stage transitions, and writes
//! results back only after the provider has answered. A provider failure
//! therefore leaves the dilemma exactly as it was, ready for a retry.
//!
//! ```text
//! Input --submit_inputs--> Questions --submit_answers--> Final
//!   ^                                                      |
//!   +------------------------restart-----------------------+
//! ```
//!
//! Both submit operations take `&mut self`, so one session can never have two
//! provider calls in flight. Dropping a pending submit discards its result.

use crate::engine::DecisionEngine;
use crate::error::DilemmaError;
use crate::session::{OptionRef, SessionState};
use crate::types::{Change, Dilemma, Stage};
use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

pub struct DilemmaSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: SessionState,
    engine: DecisionEngine,
}

impl DilemmaSession {
    pub fn new(engine: DecisionEngine) -> Self {
        let mut state = SessionState::new();
        state.initialize();
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            state,
            engine,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn dilemma(&self) -> &Dilemma {
        self.state.dilemma()
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn set_purpose(&mut self, purpose: &str) -> Result<Change, DilemmaError> {
        Ok(self.state.set_purpose(purpose)?)
    }

    pub fn add_option(&mut self, value: &str) -> Result<Change, DilemmaError> {
        Ok(self.state.add_option(value)?)
    }

    pub fn remove_option(&mut self, target: impl Into<OptionRef>) -> Result<Change, DilemmaError> {
        Ok(self.state.remove_option(target)?)
    }

    pub fn record_answer(&mut self, question: &str, choice: &str) -> Result<Change, DilemmaError> {
        Ok(self.state.record_answer(question, choice)?)
    }

    /// Generate clarification questions and move to the Questions stage
    pub async fn submit_inputs(&mut self) -> Result<Change, DilemmaError> {
        let span = tracing::info_span!("submit_inputs", session = %self.id);
        self.run_questions().instrument(span).await
    }

    /// Ask for the final decision and move to the Final stage
    pub async fn submit_answers(&mut self) -> Result<Change, DilemmaError> {
        let span = tracing::info_span!("submit_answers", session = %self.id);
        self.run_decision().instrument(span).await
    }

    async fn run_questions(&mut self) -> Result<Change, DilemmaError> {
        self.state.check_advance(Stage::Questions)?;

        let dilemma = self.state.dilemma();
        let questions = self
            .engine
            .generate_questions(&dilemma.purpose, &dilemma.options)
            .await?;
        if questions.is_empty() {
            tracing::info!("no clarification questions, decision can be requested directly");
        }

        self.state.store_questions(questions)?;
        Ok(self.state.advance(Stage::Questions)?)
    }

    async fn run_decision(&mut self) -> Result<Change, DilemmaError> {
        self.state.check_advance(Stage::Final)?;

        let dilemma = self.state.dilemma();
        let decision = self
            .engine
            .get_final_decision(&dilemma.purpose, &dilemma.options, &dilemma.answers)
            .await?;
        tracing::info!(decision = %decision.decision, "decision reached");

        self.state.store_decision(decision)?;
        Ok(self.state.advance(Stage::Final)?)
    }

    /// Throw everything away and start over
    pub fn restart(&mut self) -> Change {
        let change = self.state.reset();
        self.state.initialize();
        tracing::info!(session = %self.id, "dilemma restarted");
        change
    }
}
