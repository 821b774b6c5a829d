pub mod admission;
pub mod directory;
pub mod domain;
pub mod error;
pub mod reports;
pub mod roster;

pub use error::{ValidationError, WorkflowError};
