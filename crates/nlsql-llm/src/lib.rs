//! Completion service boundary
//!
//! The pipeline talks to a language model through [`CompletionService`]:
//! one prompt in, one text completion out. [`OpenAiCompletion`] speaks the
//! OpenAI-compatible `/chat/completions` protocol; [`ScriptedCompletion`]
//! replays canned responses for tests and demos.

pub mod provider;
pub mod openai;
pub mod mock;

pub use provider::{CompletionError, CompletionService, parse_http_error};
pub use openai::OpenAiCompletion;
pub use mock::ScriptedCompletion;
