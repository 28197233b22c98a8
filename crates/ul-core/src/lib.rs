//! userlist/crates/ul-core/src/lib.rs
//!
//! Profile models, the fetch gateway port and the paginated list controller.

pub mod controller;
pub mod date;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use controller::*;
pub use error::*;
pub use models::*;
pub use traits::*;
