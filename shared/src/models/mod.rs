//! Domain models
//!
//! Shared between the wizard engine and the HTTP client. Wire names are
//! camelCase for compatibility with the document-store backend.

pub mod cart;
pub mod customer;
pub mod operator;
pub mod plan;
pub mod tax;

// Re-exports
pub use cart::*;
pub use customer::*;
pub use operator::*;
pub use plan::*;
pub use tax::*;
