//! Operations
//!
//! This module extracts the operations declared in GraphQL documents and routes each of them to
//! the client that owns it.

mod attribution;
mod extract;
mod registry;

pub use attribution::{ClientAttributor, canonical_name};
pub use extract::operation_names;
pub use registry::OperationRegistry;
