//! Persistence and query layer for the Kudoer social app.
//!
//! The crate stores users, items, kudos, follow edges, profile pictures, and
//! password reset tokens in one SQLite file, keeps full-text search indexes
//! in step with the base tables, and exposes the operations the
//! request-handling layer drives as domain services.

pub mod app;
pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::{Kudoer, StartupError};
pub use settings::{KudoerSettings, LogFormat};
