use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use super::OperationRegistry;

/// Decides which client owns the operations of each scanned document.
///
/// Two conventions route an operation to a client:
///
/// * the document path, either `name.<client>.gql` / `name.<client>.graphql` or a file placed
///   directly in a directory named after the client;
/// * the operation name, `<client>_<Operation>`, which wins over the path and is registered
///   without its prefix.
///
/// With a single client every operation belongs to it as written.
#[derive(Debug, Clone)]
pub struct ClientAttributor {
    clients: Vec<String>,
    extension: Option<Regex>,
}

impl ClientAttributor {
    pub fn new<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clients: Vec<String> = clients.into_iter().map(Into::into).collect();
        let extension = (!clients.is_empty())
            .then(|| {
                let alternatives = clients
                    .iter()
                    .map(|client| regex::escape(client))
                    .collect::<Vec<_>>()
                    .join("|");
                Regex::new(&format!(r"\.({alternatives})\.(gql|graphql)$"))
            })
            // Escaped alternatives always form a valid pattern
            .and_then(Result::ok);

        Self { clients, extension }
    }

    /// The client named by the document path, if any
    pub fn client_from_path(&self, path: &Path) -> Option<&str> {
        let file_name = path.file_name()?.to_str()?;

        if let Some(captures) = self
            .extension
            .as_ref()
            .and_then(|extension| extension.captures(file_name))
        {
            return captures
                .get(1)
                .and_then(|client| self.known(client.as_str()));
        }

        let directory = path.parent()?.file_name()?.to_str()?;
        self.known(directory)
    }

    /// The client named by the operation's prefix, if any.
    ///
    /// The operation must start with a configured client identifier followed by `_` or by the
    /// end of the name. When several identifiers match, the longest one wins.
    pub fn client_from_prefix(&self, operation: &str) -> Option<&str> {
        self.clients
            .iter()
            .filter(|client| {
                operation
                    .strip_prefix(client.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
            })
            .max_by_key(|client| client.len())
            .map(String::as_str)
    }

    /// Registers the operations of one document and returns the operations that no client
    /// could be found for.
    pub fn attribute(
        &self,
        registry: &mut OperationRegistry,
        path: &Path,
        operations: &[String],
    ) -> Vec<String> {
        if let [client] = self.clients.as_slice() {
            for operation in operations {
                registry.register(client, operation.as_str());
            }
            return Vec::new();
        }

        let client_from_path = self.client_from_path(path);
        let mut unroutable = Vec::new();

        for operation in operations {
            if let Some(client) = self
                .client_from_prefix(operation)
                .filter(|client| registry.contains_client(client))
            {
                let canonical = canonical_name(client, operation);
                if registry.register(client, canonical) {
                    debug!(%client, %operation, canonical, "Attributed operation by prefix");
                }
                continue;
            }

            match client_from_path {
                Some(client) => {
                    if registry.register(client, operation.as_str()) {
                        debug!(
                            %client,
                            %operation,
                            path = %path.display(),
                            "Attributed operation by path"
                        );
                    }
                }
                None => {
                    warn!(
                        %operation,
                        path = %path.display(),
                        "Operation matches no client by path or prefix and is not routed"
                    );
                    unroutable.push(operation.clone());
                }
            }
        }

        unroutable
    }

    fn known<'a>(&'a self, candidate: &str) -> Option<&'a str> {
        self.clients
            .iter()
            .find(|client| client.as_str() == candidate)
            .map(String::as_str)
    }
}

/// The operation name without the `<client>_` prefix
pub fn canonical_name<'a>(client: &str, operation: &'a str) -> &'a str {
    operation
        .strip_prefix(client)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(operation)
}
