//! # Vantage Core
//!
//! Domain types, traits, and error definitions for the Vantage
//! conversational backend. This crate has **no transport dependencies**;
//! it defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, retrieval providers,
//! key-value cache, long-term archive) is a trait here, injected into the
//! components that use it. Implementations live in their respective crates:
//! - Swapping implementations via configuration
//! - Testing every component with in-process fakes
//! - Clean dependency graph (all crates depend inward on core)

pub mod archive;
pub mod cache;
pub mod cancel;
pub mod completion;
pub mod decision;
pub mod error;
pub mod event;
pub mod message;
pub mod outcome;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use archive::{ArchiveRecord, ArchiveSink, NoopArchive};
pub use cache::CacheStore;
pub use cancel::CancellationToken;
pub use completion::{CompletionRequest, CompletionResponse, CompletionService, ResponseFormat};
pub use decision::{ArchiveDirective, RouterAction, RouterDecision};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationTurn, Message, Role, SessionKey, TurnRole};
pub use outcome::{HandleOutcome, RESERVED_SOURCE_IDS, ResponseSource};
pub use retrieval::{AnswerBody, ProviderAnswer, ProviderClient, RetrievalRecord, RetrievalSource};
