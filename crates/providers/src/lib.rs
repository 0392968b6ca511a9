//! Completion service implementations for Vantage.
//!
//! All backends implement `vantage_core::CompletionService`.

pub mod factory;
pub mod openai_compat;

pub use factory::build_from_config;
pub use openai_compat::OpenAiCompatProvider;
