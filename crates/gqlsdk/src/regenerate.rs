//! Regeneration on document changes

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::{Stream, StreamExt as _};
use gqlsdk_documents::{DocumentEvent, DocumentEventKind};
use tracing::{debug, error, info};

use crate::artifacts::Artifacts;
use crate::errors::GenerateError;
use crate::generator::Generator;

/// Where and how artifacts are rendered
#[derive(Debug, Clone)]
pub struct Output {
    pub dir: PathBuf,
    pub auto_import: bool,
}

/// Runs one generation pass and renders its artifacts
pub async fn render(generator: &Generator, output: &Output) -> Result<Artifacts, GenerateError> {
    let start = Instant::now();

    let artifacts = generator.generate().await?;
    artifacts.write_to(&output.dir, output.auto_import).await?;

    info!(
        operations = artifacts.registry.len(),
        "Generation completed in {}ms",
        start.elapsed().as_millis()
    );
    Ok(artifacts)
}

/// Re-renders the artifacts for every relevant document event until the stream ends.
///
/// Events are handled one at a time. A failed pass is logged and leaves the previous artifacts in
/// place.
pub async fn regenerate<S>(generator: &Generator, output: &Output, events: S)
where
    S: Stream<Item = DocumentEvent>,
{
    let mut events = std::pin::pin!(events);

    while let Some(event) = events.next().await {
        if event.kind != DocumentEventKind::Removed && is_blank(&event.path).await {
            debug!(path = %event.path.display(), "Ignoring change to an empty document");
            continue;
        }

        info!(kind = ?event.kind, path = %event.path.display(), "Document changed, regenerating");
        if let Err(error) = render(generator, output).await {
            error!("Failed to regenerate the GraphQL SDK: {error}");
        }
    }
}

async fn is_blank(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.len() == 0)
        .unwrap_or(true)
}
