//! GraphQL document sources
//!
//! Finds the `.gql`/`.graphql` documents under a set of roots and watches those roots for
//! changes so the SDK can be regenerated.

pub mod discovery;
pub mod files;

pub use discovery::{DOCUMENT_GLOB, DiscoveryError, discover, is_document};
pub use files::{DocumentEvent, DocumentEventKind, watch};
