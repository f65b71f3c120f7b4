use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::prelude::*;
use notify::Config;
use notify::EventKind;
use notify::PollWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::discovery::is_document;

#[cfg(not(test))]
const DEFAULT_WATCH_DURATION: Duration = Duration::from_secs(1);

#[cfg(test)]
const DEFAULT_WATCH_DURATION: Duration = Duration::from_millis(100);

const EVENT_BUFFER: usize = 64;

/// What happened to a watched document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEventKind {
    Added,
    Changed,
    Removed,
}

/// A change to a GraphQL document under one of the watched roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    pub kind: DocumentEventKind,
    pub path: PathBuf,
}

/// Creates a stream of events for every GraphQL document added, changed or removed under the
/// given roots. The stream never terminates and must be dropped to finish watching.
///
/// Roots that cannot be watched are logged and skipped.
pub fn watch(roots: &[PathBuf]) -> impl Stream<Item = DocumentEvent> + use<> {
    watch_with_duration(roots, DEFAULT_WATCH_DURATION)
}

fn watch_with_duration(
    roots: &[PathBuf],
    duration: Duration,
) -> impl Stream<Item = DocumentEvent> + use<> {
    let (watch_sender, watch_receiver) = mpsc::channel(EVENT_BUFFER);
    let watch_receiver_stream = tokio_stream::wrappers::ReceiverStream::new(watch_receiver);

    // The poll watcher behaves the same on every platform and file system. Comparing contents
    // avoids events for files that were touched but not changed.
    let config = Config::default()
        .with_poll_interval(duration)
        .with_compare_contents(true);

    let watcher = PollWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                let Some(kind) = event_kind(&event.kind) else {
                    return;
                };
                for path in event.paths.iter().filter(|path| is_document(path)) {
                    forward(
                        &watch_sender,
                        DocumentEvent {
                            kind,
                            path: path.clone(),
                        },
                    );
                }
            }
            Err(e) => tracing::error!("event error: {:?}", e),
        },
        config,
    );

    let watcher = match watcher {
        Ok(mut watcher) => {
            for root in roots {
                watch_root(&mut watcher, root);
            }
            Some(watcher)
        }
        Err(e) => {
            tracing::error!("could not create document watcher: {e}");
            None
        }
    };

    watch_receiver_stream
        .chain(stream::once(async move {
            // Gives the stream ownership of the watcher so it lives as long as the stream.
            // The receiver never closes while the watcher is alive, so this never runs.
            drop(watcher);
        })
        .filter_map(|_| future::ready(None::<DocumentEvent>)))
        .boxed()
}

fn watch_root(watcher: &mut PollWatcher, root: &Path) {
    match watcher.watch(root, RecursiveMode::Recursive) {
        Ok(()) => tracing::debug!(root = %root.display(), "Watching documents"),
        Err(e) => tracing::warn!(root = %root.display(), "could not watch document root: {e}"),
    }
}

fn event_kind(kind: &EventKind) -> Option<DocumentEventKind> {
    match kind {
        EventKind::Create(_) => Some(DocumentEventKind::Added),
        EventKind::Modify(_) => Some(DocumentEventKind::Changed),
        EventKind::Remove(_) => Some(DocumentEventKind::Removed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn forward(sender: &mpsc::Sender<DocumentEvent>, event: DocumentEvent) {
    let mut event = event;
    loop {
        match sender.try_send(event) {
            Ok(()) => break,
            Err(TrySendError::Full(returned)) => {
                tracing::warn!("document event buffer is full, retrying");
                event = returned;
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("document event receiver dropped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    async fn next_event(
        stream: &mut (impl Stream<Item = DocumentEvent> + Unpin),
    ) -> Option<DocumentEvent> {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn it_reports_new_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = watch(&[dir.path().to_path_buf()]);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let path = dir.path().join("launches.gql");
        fs::write(&path, "query Launches { id }").unwrap();

        let event = next_event(&mut events).await.expect("an event for the new file");
        assert_eq!(event.path, path);
        assert_eq!(event.kind, DocumentEventKind::Added);
    }

    #[tokio::test]
    async fn it_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = watch(&[dir.path().to_path_buf()]);

        tokio::time::sleep(Duration::from_millis(250)).await;
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let path = dir.path().join("ships.graphql");
        fs::write(&path, "query Ships { id }").unwrap();

        let event = next_event(&mut events).await.expect("an event for the document");
        assert_eq!(event.path, path);
    }

    #[test]
    fn it_maps_event_kinds() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind};

        assert_eq!(
            event_kind(&EventKind::Create(CreateKind::Any)),
            Some(DocumentEventKind::Added)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(DocumentEventKind::Changed)
        );
        assert_eq!(
            event_kind(&EventKind::Remove(RemoveKind::Any)),
            Some(DocumentEventKind::Removed)
        );
        assert_eq!(event_kind(&EventKind::Any), None);
    }
}
