//! GraphQL clients
//!
//! A project talks to one or more named GraphQL endpoints. Each client is configured either with
//! a bare host or with a host, a bearer token and a default flag, and environment variables can
//! override the host and token at runtime.

use indexmap::IndexMap;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::errors::ConfigError;

/// Identifier of the implicit client built from `GQL_HOST`
pub const DEFAULT_CLIENT: &str = "default";

/// A client as written in the configuration
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ClientConfig {
    /// Just the endpoint of the client
    Host(String),

    /// The endpoint plus options
    Detailed {
        /// The GraphQL endpoint
        #[serde(default)]
        host: Option<String>,

        /// Bearer token sent to the endpoint
        #[serde(default)]
        #[schemars(with = "Option<String>")]
        token: Option<SecretString>,

        /// Marks the client used by unscoped calls
        #[serde(default)]
        default: bool,
    },
}

impl ClientConfig {
    fn host(&self) -> Option<&str> {
        match self {
            ClientConfig::Host(host) => Some(host),
            ClientConfig::Detailed { host, .. } => host.as_deref(),
        }
    }

    fn token(&self) -> Option<&SecretString> {
        match self {
            ClientConfig::Host(_) => None,
            ClientConfig::Detailed { token, .. } => token.as_ref(),
        }
    }

    fn is_default(&self) -> bool {
        matches!(self, ClientConfig::Detailed { default: true, .. })
    }
}

/// A fully resolved GraphQL client
#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,
    pub host: Url,
    pub token: Option<SecretString>,
    pub default: bool,
}

/// The configured clients of a generation run, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Clients(Vec<Client>);

impl Clients {
    /// Resolves the configured clients, letting the environment override hosts and tokens.
    ///
    /// `env` looks up an environment variable by name. With no configured clients, a single
    /// [`DEFAULT_CLIENT`] is built from `GQL_HOST`.
    pub fn resolve<F>(configs: &IndexMap<String, ClientConfig>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if configs.is_empty() {
            let host = env(&host_variable(DEFAULT_CLIENT)).ok_or(ConfigError::NoClients)?;
            let implicit = IndexMap::from([(DEFAULT_CLIENT.to_string(), ClientConfig::Host(host))]);
            return Self::resolve(&implicit, env);
        }

        if configs.len() > 1 {
            let defaults = configs
                .iter()
                .filter(|(id, config)| id.as_str() == DEFAULT_CLIENT || config.is_default())
                .count();
            if defaults > 1 {
                return Err(ConfigError::MultipleDefaults(defaults));
            }
        }

        let mut clients = Vec::with_capacity(configs.len());
        for (id, config) in configs {
            let host = env(&host_variable(id))
                .or_else(|| config.host().map(str::to_string))
                .filter(|host| !host.is_empty())
                .ok_or_else(|| ConfigError::MissingHost(id.clone()))?;
            let host = Url::parse(&host).map_err(|source| ConfigError::InvalidHost {
                client: id.clone(),
                host: host.clone(),
                source,
            })?;
            let token = env(&token_variable(id))
                .map(SecretString::from)
                .or_else(|| config.token().cloned());

            debug!(client = %id, %host, token = token.is_some(), "Resolved GraphQL client");
            clients.push(Client {
                id: id.clone(),
                host,
                token,
                default: config.is_default(),
            });
        }

        Ok(Self(clients))
    }

    /// Resolves the clients against the process environment
    pub fn from_env(configs: &IndexMap<String, ClientConfig>) -> Result<Self, ConfigError> {
        Self::resolve(configs, |name| std::env::var(name).ok())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|client| client.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether operations have to be routed between several clients
    pub fn is_multiple(&self) -> bool {
        self.0.len() > 1
    }
}

impl From<Vec<Client>> for Clients {
    fn from(clients: Vec<Client>) -> Self {
        Self(clients)
    }
}

fn host_variable(id: &str) -> String {
    if id == DEFAULT_CLIENT {
        "GQL_HOST".to_string()
    } else {
        format!("GQL_{}_HOST", id.to_uppercase())
    }
}

fn token_variable(id: &str) -> String {
    if id == DEFAULT_CLIENT {
        "GQL_TOKEN".to_string()
    } else {
        format!("GQL_{}_TOKEN", id.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret as _;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn configs(json: &str) -> IndexMap<String, ClientConfig> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn it_builds_the_default_client_from_gql_host() {
        let clients =
            Clients::resolve(&IndexMap::new(), env(&[("GQL_HOST", "https://h/graphql")])).unwrap();

        assert_eq!(clients.ids().collect::<Vec<_>>(), vec![DEFAULT_CLIENT]);
        assert_eq!(
            clients.iter().next().unwrap().host.as_str(),
            "https://h/graphql"
        );
    }

    #[test]
    fn it_requires_gql_host_without_clients() {
        let result = Clients::resolve(&IndexMap::new(), env(&[]));

        assert!(matches!(result, Err(ConfigError::NoClients)));
    }

    #[test]
    fn it_keeps_declaration_order() {
        let configs = configs(
            r#"{
                "spacex": "https://api.spacex.land/graphql",
                "github": { "host": "https://api.github.com/graphql", "token": "secret" }
            }"#,
        );

        let clients = Clients::resolve(&configs, env(&[])).unwrap();

        assert_eq!(clients.ids().collect::<Vec<_>>(), vec!["spacex", "github"]);
        assert!(clients.is_multiple());
        let github = clients.iter().nth(1).unwrap();
        assert_eq!(
            github.token.as_ref().map(|token| token.expose_secret()),
            Some("secret")
        );
    }

    #[test]
    fn it_rejects_more_than_one_default() {
        let configs = configs(
            r#"{
                "default": "https://a/graphql",
                "github": { "host": "https://b/graphql", "default": true }
            }"#,
        );

        let result = Clients::resolve(&configs, env(&[]));

        assert!(matches!(result, Err(ConfigError::MultipleDefaults(2))));
    }

    #[test]
    fn it_allows_a_single_client_named_default_with_the_flag() {
        let configs = configs(r#"{ "default": { "host": "https://a/graphql", "default": true } }"#);

        assert!(Clients::resolve(&configs, env(&[])).is_ok());
    }

    #[test]
    fn it_lets_the_environment_override_host_and_token() {
        let configs = configs(
            r#"{
                "spacex": { "host": "https://from-config/graphql", "token": "config" },
                "github": { "default": true }
            }"#,
        );

        let clients = Clients::resolve(
            &configs,
            env(&[
                ("GQL_SPACEX_HOST", "https://from-env/graphql"),
                ("GQL_SPACEX_TOKEN", "env"),
                ("GQL_GITHUB_HOST", "https://github/graphql"),
            ]),
        )
        .unwrap();

        let spacex = clients.iter().next().unwrap();
        assert_eq!(spacex.host.as_str(), "https://from-env/graphql");
        assert_eq!(
            spacex.token.as_ref().map(|token| token.expose_secret()),
            Some("env")
        );
        let github = clients.iter().nth(1).unwrap();
        assert!(github.default);
        assert_eq!(github.host.as_str(), "https://github/graphql");
    }

    #[test]
    fn it_reports_a_missing_host() {
        let configs = configs(r#"{ "spacex": "https://a/graphql", "github": { "token": "t" } }"#);

        let result = Clients::resolve(&configs, env(&[]));

        assert!(matches!(result, Err(ConfigError::MissingHost(id)) if id == "github"));
    }

    #[test]
    fn it_reports_an_invalid_host() {
        let configs = configs(r#"{ "spacex": "not a url" }"#);

        let result = Clients::resolve(&configs, env(&[]));

        assert!(matches!(result, Err(ConfigError::InvalidHost { client, .. }) if client == "spacex"));
    }
}
