//! truthbot/crates/llm-adapters/src/lib.rs
//!
//! `LanguageModel` implementations. Only the OpenAI-compatible wire format is
//! spoken today; OpenRouter is the default endpoint.

pub mod openai;

pub use openai::{ClientOptions, OpenAiCompatibleClient};
