//! DilemmAI - let AI make your choices smarter, not random
//!
//! A user states a dilemma and a few options. A language model asks two or
//! three clarification questions, the user answers them, and the model picks
//! the best option with a reason.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dilemmai::{ChatCompletionProvider, Config, DecisionEngine, DilemmaSession};
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! let provider = ChatCompletionProvider::new(config.provider.clone())?;
//! let engine = DecisionEngine::new(Arc::new(provider)).with_strictness(config.strictness);
//! let mut session = DilemmaSession::new(engine);
//!
//! session.set_purpose("Where should we go this weekend?")?;
//! session.add_option("Mountains")?;
//! session.add_option("Beach")?;
//! session.submit_inputs().await?;
//!
//! for q in session.dilemma().questions.clone() {
//!     session.record_answer(&q.text, &q.options[0])?;
//! }
//! session.submit_answers().await?;
//! println!("{:?}", session.dilemma().decision);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │         Presentation (REPL, one-shot)         │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │  DilemmaSession                               │
//! │    SessionState   → stage-gated Dilemma       │
//! │    DecisionEngine → prompts + tolerant parse  │
//! └──────────────────────┬───────────────────────┘
//!                        ▼ CompletionProvider
//! ┌──────────────────────────────────────────────┐
//! │      Hosted chat-completion endpoint          │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod flow;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod types;

// Core types
pub use types::*;

// Errors
pub use error::{ConfigError, DilemmaError, ExtractError, ProviderError, ValidationFailure};

// State and flow
pub use flow::DilemmaSession;
pub use session::{OptionRef, SessionState};

// Engine and providers
pub use engine::{DecisionEngine, DecisionStrictness};
pub use extract::{extract_json_array, extract_json_object};
pub use provider::{ChatCompletionProvider, CompletionProvider, ProviderConfig, ScriptedProvider};

pub use config::Config;
