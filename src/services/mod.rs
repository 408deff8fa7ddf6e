//! Service layer
//!
//! Business logic over the storage facade: mode/config management,
//! cheatsheet and entry operations, and AI-assisted generation.

pub mod ai;
pub mod mode;
pub mod sheets;

pub use ai::{AiGenerator, GeneratedEntry, GenerationRequest};
pub use mode::ModeManager;
pub use sheets::{NewEntry, SheetService};
