use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// The operations owned by each client during one generation run.
///
/// Every client gets a bucket when the registry is created and the set of buckets never changes
/// afterwards. Buckets keep insertion order and ignore duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperationRegistry {
    buckets: IndexMap<String, IndexSet<String>>,
}

impl OperationRegistry {
    /// Creates a registry with one empty bucket per client
    pub fn new<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: clients
                .into_iter()
                .map(|client| (client.into(), IndexSet::new()))
                .collect(),
        }
    }

    /// Whether the client has a bucket
    pub fn contains_client(&self, client: &str) -> bool {
        self.buckets.contains_key(client)
    }

    /// Adds an operation to a client's bucket.
    ///
    /// Returns `false` when the client is unknown or already owns the operation.
    pub fn register(&mut self, client: &str, operation: impl Into<String>) -> bool {
        self.buckets
            .get_mut(client)
            .is_some_and(|bucket| bucket.insert(operation.into()))
    }

    /// The operations of a client in registration order
    pub fn operations(&self, client: &str) -> impl Iterator<Item = &str> {
        self.buckets
            .get(client)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(String::as_str))
    }

    pub fn contains(&self, client: &str, operation: &str) -> bool {
        self.buckets
            .get(client)
            .is_some_and(|bucket| bucket.contains(operation))
    }

    pub fn clients(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Every (client, operation) pair, clients in declaration order and operations in
    /// registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buckets.iter().flat_map(|(client, bucket)| {
            bucket
                .iter()
                .map(move |operation| (client.as_str(), operation.as_str()))
        })
    }

    /// The number of registered operations across all clients
    pub fn len(&self) -> usize {
        self.buckets.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::OperationRegistry;

    #[test]
    fn it_starts_with_an_empty_bucket_per_client() {
        let registry = OperationRegistry::new(["spacex", "github"]);

        assert_eq!(registry.clients().collect::<Vec<_>>(), vec!["spacex", "github"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn it_deduplicates_and_keeps_order() {
        let mut registry = OperationRegistry::new(["spacex"]);

        assert!(registry.register("spacex", "Launches"));
        assert!(registry.register("spacex", "Ships"));
        assert!(!registry.register("spacex", "Launches"));

        assert_eq!(
            registry.operations("spacex").collect::<Vec<_>>(),
            vec!["Launches", "Ships"]
        );
    }

    #[test]
    fn it_never_adds_clients() {
        let mut registry = OperationRegistry::new(["spacex"]);

        assert!(!registry.register("github", "Viewer"));

        assert_eq!(registry.clients().collect::<Vec<_>>(), vec!["spacex"]);
        assert_eq!(registry.operations("github").count(), 0);
    }

    #[test]
    fn it_keeps_client_namespaces_apart() {
        let mut registry = OperationRegistry::new(["spacex", "github"]);

        assert!(registry.register("spacex", "Launches"));
        assert!(registry.register("github", "Launches"));

        assert_eq!(
            registry.iter().collect::<Vec<_>>(),
            vec![("spacex", "Launches"), ("github", "Launches")]
        );
    }

    #[test]
    fn it_serializes_as_a_map() {
        let mut registry = OperationRegistry::new(["spacex", "github"]);
        registry.register("spacex", "Launches");

        insta::assert_json_snapshot!(registry, @r#"
        {
          "spacex": [
            "Launches"
          ],
          "github": []
        }
        "#);
    }
}
