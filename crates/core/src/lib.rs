//! Storyweave domain core.
//!
//! Pure domain logic with no database or network access: the Twine import
//! pipeline (parse, repair, validate, convert), the approval state machine
//! rules, naming/credit derivation, audit action vocabulary, and the shared
//! error taxonomy. The db/events/api crates build on these types.

pub mod approval;
pub mod audit;
pub mod cache;
pub mod error;
pub mod graph;
pub mod naming;
pub mod twine;
pub mod twison;
pub mod types;
