use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use tracing::debug;

/// Glob matching every GraphQL document under a root
pub const DOCUMENT_GLOB: &str = "**/*.{gql,graphql}";

const DOCUMENT_EXTENSIONS: [&str; 2] = ["gql", "graphql"];

/// An error while expanding document globs
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Invalid document glob {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("Could not walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Could not read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the path names a GraphQL document, judged by its extension
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| DOCUMENT_EXTENSIONS.contains(&extension))
}

/// Expands [`DOCUMENT_GLOB`] under each root and returns the non-empty documents found.
///
/// Roots are visited in order and each root's files are sorted, so the result is stable across
/// runs. A file reachable from several roots is only listed once, at its first position, even
/// when the roots spell its path differently (`.` and `./queries`, say).
/// Hidden entries, `.gitignore`d entries and `node_modules` are skipped.
pub fn discover(roots: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut documents: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for root in roots {
        for file in discover_root(root)? {
            let canonical =
                std::fs::canonicalize(&file).map_err(|source| DiscoveryError::Metadata {
                    path: file.clone(),
                    source,
                })?;
            if seen.insert(canonical) {
                documents.push(file);
            } else {
                debug!(path = %file.display(), "Skipping document reached from another root");
            }
        }
    }

    Ok(documents)
}

fn discover_root(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let matcher = document_matcher(root)?;
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .build();

    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }

        let path = entry.path();
        if !matcher.matched(path, false).is_whitelist() {
            continue;
        }

        if is_empty(path)? {
            debug!(?path, "Skipping empty document");
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "Discovered documents");
    Ok(files)
}

fn document_matcher(root: &Path) -> Result<Override, DiscoveryError> {
    let glob_error = |source| DiscoveryError::Glob {
        pattern: DOCUMENT_GLOB.to_string(),
        source,
    };

    let mut builder = OverrideBuilder::new(root);
    builder.add(DOCUMENT_GLOB).map_err(glob_error)?;
    builder.build().map_err(glob_error)
}

fn is_empty(path: &Path) -> Result<bool, DiscoveryError> {
    std::fs::metadata(path)
        .map(|metadata| metadata.len() == 0)
        .map_err(|source| DiscoveryError::Metadata {
            path: path.to_path_buf(),
            source,
        })
}
