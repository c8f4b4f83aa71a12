//! Services layer
//!
//! This module contains the client-side logic built on top of the API layer:
//! - `session` - explicit authentication context
//! - `learning` / `content` - cached wrappers around the endpoint traits
//! - `progress` - pure derivations of flow progress
//! - `flow` - the enrollment flow controller

pub mod content;
pub mod flow;
pub mod learning;
pub mod progress;
pub mod session;

#[cfg(test)]
mod testing;

pub use content::ContentService;
pub use flow::{EnrollmentFlow, FlowError, ReturnTarget};
pub use learning::LearningService;
pub use progress::Substep;
pub use session::Session;
