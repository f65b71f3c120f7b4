use std::path::PathBuf;

use gqlsdk::client::ClientConfig;
use gqlsdk::generator::DEFAULT_FUNCTION_PREFIX;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;

use super::logging::Logging;

/// Configuration for SDK generation
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// GraphQL clients keyed by identifier, each either a host or `{ host, token, default }`.
    /// Without clients, a `default` client is built from `GQL_HOST`.
    pub clients: IndexMap<String, ClientConfig>,

    /// Project source directory searched for documents
    pub root: PathBuf,

    /// Additional directories searched for documents
    pub document_paths: Vec<PathBuf>,

    /// Directory the artifacts are written to
    pub output_dir: PathBuf,

    /// Prefix of the exported functions
    pub function_prefix: String,

    /// Render the export surface next to the SDK
    pub auto_import: bool,

    /// Only generate the types used by operations
    pub only_operation_types: bool,

    /// Silence the codegen engine output
    pub silent: bool,

    /// Regenerate whenever a document changes
    pub watch: bool,

    /// Codegen engine configuration
    pub codegen: Codegen,

    /// Logging configuration
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clients: IndexMap::new(),
            root: PathBuf::from("."),
            document_paths: Vec::new(),
            output_dir: PathBuf::from(".gql"),
            function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
            auto_import: true,
            only_operation_types: true,
            silent: true,
            watch: false,
            codegen: Codegen::default(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Reorders the clients to follow `declared`. Clients missing from it keep their relative
    /// order and come last.
    pub fn order_clients(&mut self, declared: &[String]) {
        let rank = |id: &String| {
            declared
                .iter()
                .position(|candidate| candidate == id)
                .unwrap_or(declared.len())
        };
        self.clients
            .sort_by(|left, _, right, _| rank(left).cmp(&rank(right)));
    }

    /// The directories searched for documents, the project root first
    pub fn document_roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.root.clone())
            .chain(self.document_paths.iter().cloned())
            .collect()
    }
}

/// Codegen engine options
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Codegen {
    /// Command line invoking `graphql-codegen`, `--config <file>` is appended
    pub command: Vec<String>,
}

impl Default for Codegen {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "graphql-codegen".to_string()],
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::Config;

    #[test]
    fn it_parses_a_minimal_config() {
        let config = serde_json::from_str::<Config>("{}").unwrap();

        assert!(config.clients.is_empty());
        assert_eq!(config.output_dir, PathBuf::from(".gql"));
        assert_eq!(config.function_prefix, "Gql");
        assert!(config.auto_import);
        assert!(!config.watch);
        assert_eq!(config.codegen.command, vec!["npx", "graphql-codegen"]);
    }

    #[test]
    fn it_searches_the_root_first() {
        let config = serde_json::from_str::<Config>(
            r#"{ "root": "app", "document_paths": ["shared/graphql"] }"#,
        )
        .unwrap();

        assert_eq!(
            config.document_roots(),
            vec![PathBuf::from("app"), PathBuf::from("shared/graphql")]
        );
    }

    #[test]
    fn it_orders_clients_as_declared() {
        let mut config = serde_json::from_str::<Config>(
            r#"{ "clients": { "artsy": "https://a/graphql", "github": "https://g/graphql", "spacex": "https://s/graphql" } }"#,
        )
        .unwrap();

        config.order_clients(&["spacex".to_string(), "artsy".to_string()]);

        assert_eq!(
            config.clients.keys().collect::<Vec<_>>(),
            vec!["spacex", "artsy", "github"]
        );
    }

    #[test]
    fn it_contains_no_keys_with_double_underscore() {
        // Environment overrides split nested keys on `__`, a field containing it could not be
        // set from the environment. See [runtime::read_config]
        let schema = schemars::schema_for!(Config).to_value().to_string();

        assert!(!schema.contains("__"))
    }
}
