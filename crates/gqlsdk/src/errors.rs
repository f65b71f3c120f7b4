use std::path::PathBuf;

use apollo_compiler::{ast::Document, validation::WithErrors};
use gqlsdk_documents::DiscoveryError;

/// An error in the client configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GQL_HOST is not set and no clients are configured")]
    NoClients,

    #[error("Only one client can have the default flag set, found {0}")]
    MultipleDefaults(usize),

    #[error("GraphQL client ({0}) is missing its host")]
    MissingHost(String),

    #[error("GraphQL client ({client}) has an invalid host {host}: {source}")]
    InvalidHost {
        client: String,
        host: String,
        #[source]
        source: url::ParseError,
    },
}

/// An error while extracting operations from a GraphQL document
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Could not parse GraphQL document: {0}")]
    GraphQLDocument(Box<WithErrors<Document>>),

    #[error("Operation name missing in: {}", source_path.display())]
    MissingName {
        source_path: PathBuf,
        operation: String,
    },
}

/// An error reported by the codegen engine
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("No codegen command configured")]
    NoCommand,

    #[error("Could not run codegen command {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Codegen command {command} failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Invalid codegen config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Codegen I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An error that aborts a generation pass
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Could not read document {}: {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Code generation failed: {0}")]
    Codegen(#[from] CodegenError),

    #[error("Could not write {}: {source}", path.display())]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
