//! Request orchestration for Vantage.
//!
//! For every inbound message the [`Orchestrator`] runs a fixed sequence:
//!
//! 1. **Classify** with the [`IntentRouter`] (retrieve or respond, save or not)
//! 2. **Retrieve** through the failsafe cascade when needed
//! 3. **Recall** the session's hot window and briefing
//! 4. **Synthesize** the reply in the configured persona
//!
//! and returns `{response, source, save_data}`. Nothing here fails the
//! request; the worst case is a fixed degraded reply.

pub mod factory;
pub mod orchestrator;
pub mod persona;
pub mod router;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use factory::build_from_config;
pub use orchestrator::{Orchestrator, SynthesisSettings, build_synthesis_messages};
pub use persona::Persona;
pub use router::{IntentRouter, decision_schema, parse_decision};
