//! Client-side core of the education center back office: typed access to
//! the REST backend, the admission review workflow, roster tables,
//! directory listings and branch reports.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod workflows;

pub use config::AppConfig;
pub use error::AppError;
pub use session::{load_session, Permission, Session};
