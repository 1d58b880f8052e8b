//! Completion service implementations for autoline.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
