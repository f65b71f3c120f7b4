//! Generated artifacts

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codegen::SDK_FILE;
use crate::errors::GenerateError;
use crate::exports::ExportDescriptor;
use crate::operations::OperationRegistry;

/// Module exporting the prefixed SDK functions
pub const IMPORTS_FILE: &str = "gql.mjs";

/// Ambient declarations of the exported functions
pub const DECLARATIONS_FILE: &str = "gql.d.ts";

/// Auto import descriptors of the exported functions
pub const DESCRIPTORS_FILE: &str = "gql-imports.json";

/// Everything produced by one successful generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// The SDK source, stripped of client prefixes
    pub sdk: String,
    pub imports: String,
    pub declarations: String,
    pub descriptors: Vec<ExportDescriptor>,
    pub registry: OperationRegistry,
}

impl Artifacts {
    /// Writes the artifacts into `dir`, creating it if needed, and returns the written paths.
    ///
    /// The export surface files are only written when `auto_import` is set. Every file is first
    /// staged next to its destination and only renamed into place once all of them were written,
    /// so a failed write leaves the previous artifacts untouched.
    pub async fn write_to(
        &self,
        dir: &Path,
        auto_import: bool,
    ) -> Result<Vec<PathBuf>, GenerateError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| GenerateError::WriteArtifact {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut files = vec![(SDK_FILE, self.sdk.clone())];
        if auto_import {
            files.push((IMPORTS_FILE, self.imports.clone()));
            files.push((DECLARATIONS_FILE, self.declarations.clone()));
            files.push((
                DESCRIPTORS_FILE,
                serde_json::to_string_pretty(&self.descriptors)?,
            ));
        }

        let mut staged = Vec::with_capacity(files.len());
        for (name, contents) in files {
            let staging = staging_path(dir, name);
            if let Err(source) = tokio::fs::write(&staging, contents).await {
                discard(&staged).await;
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(GenerateError::WriteArtifact {
                    path: staging,
                    source,
                });
            }
            staged.push((staging, dir.join(name)));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (index, (staging, path)) in staged.iter().enumerate() {
            if let Err(source) = tokio::fs::rename(staging, path).await {
                discard(staged.get(index..).unwrap_or_default()).await;
                return Err(GenerateError::WriteArtifact {
                    path: path.clone(),
                    source,
                });
            }
            debug!(path = %path.display(), "Wrote artifact");
            written.push(path.clone());
        }

        Ok(written)
    }
}

/// Hidden sibling a file is written to before being moved into place
fn staging_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{name}.tmp"))
}

async fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(error) = tokio::fs::remove_file(staging).await {
            warn!(path = %staging.display(), "Could not remove staged artifact: {error}");
        }
    }
}
