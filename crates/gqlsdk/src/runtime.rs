//! Runtime utilities
//!
//! This module is only used by the binaries and provides the configuration and logging setup.

mod config;
mod logging;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use indexmap::IndexMap;
pub use logging::setup_logging;
use serde::Deserialize;

/// Prefix of the environment variables overriding the configuration
const ENV_PREFIX: &str = "GQLSDK_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, with environment variables taking precedence
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    let yaml_path = yaml_path.as_ref();
    let mut config: Config = Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()?;

    // figment sorts map keys, the file decides the client order
    if let Ok(contents) = std::fs::read_to_string(yaml_path) {
        config.order_clients(&declared_clients(&contents)?);
    }

    Ok(config)
}

/// The client identifiers in the order the YAML document declares them
#[allow(clippy::result_large_err)]
fn declared_clients(contents: &str) -> Result<Vec<String>, figment::Error> {
    #[derive(Deserialize)]
    struct Declared {
        #[serde(default)]
        clients: IndexMap<String, serde_yaml::Value>,
    }

    let declared: Option<Declared> =
        serde_yaml::from_str(contents).map_err(|e| figment::Error::from(e.to_string()))?;
    Ok(declared
        .map(|declared| declared.clients.into_keys().collect())
        .unwrap_or_default())
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use gqlsdk::client::ClientConfig;

    use super::{read_config, read_config_from_env};

    #[test]
    fn it_reads_clients_from_the_file() {
        let config = r#"
            clients:
              spacex: https://api.spacex.land/graphql
              github:
                host: https://api.github.com/graphql
                token: ghp_token
                default: true
        "#;

        figment::Jail::expect_with(move |jail| {
            jail.create_file("gqlsdk.yaml", config)?;

            let config = read_config("gqlsdk.yaml")?;

            assert_eq!(config.clients.len(), 2);
            assert!(matches!(
                config.clients.get("spacex"),
                Some(ClientConfig::Host(host)) if host == "https://api.spacex.land/graphql"
            ));
            assert!(matches!(
                config.clients.get("github"),
                Some(ClientConfig::Detailed { default: true, .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn it_keeps_the_declared_client_order() {
        let config = r#"
            clients:
              spacex: https://api.spacex.land/graphql
              github: https://api.github.com/graphql
              artsy: https://metaphysics.artsy.net/graphql
        "#;

        figment::Jail::expect_with(move |jail| {
            jail.create_file("gqlsdk.yaml", config)?;
            jail.set_env("GQLSDK_CLIENTS__BACKSTAGE", "https://backstage/graphql");

            let config = read_config("gqlsdk.yaml")?;

            assert_eq!(
                config.clients.keys().collect::<Vec<_>>(),
                vec!["spacex", "github", "artsy", "backstage"]
            );
            Ok(())
        });
    }

    #[test]
    fn it_prioritizes_env_vars() {
        let config = r#"
            output_dir: from-file
        "#;

        figment::Jail::expect_with(move |jail| {
            jail.create_file("gqlsdk.yaml", config)?;
            jail.set_env("GQLSDK_OUTPUT_DIR", "from-env");

            let config = read_config("gqlsdk.yaml")?;

            assert_eq!(config.output_dir, PathBuf::from("from-env"));
            Ok(())
        });
    }

    #[test]
    fn it_extracts_nested_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GQLSDK_LOGGING__LEVEL", "debug");
            jail.set_env("GQLSDK_CLIENTS__SPACEX", "https://api.spacex.land/graphql");

            let config = read_config_from_env()?;

            assert_eq!(config.logging.level, tracing::Level::DEBUG);
            assert!(config.clients.contains_key("spacex"));
            Ok(())
        });
    }

    #[test]
    fn it_merges_env_and_file() {
        let config = "
            function_prefix: Query
        ";

        figment::Jail::expect_with(move |jail| {
            jail.create_file("gqlsdk.yaml", config)?;
            jail.set_env("GQLSDK_AUTO_IMPORT", "false");

            let config = read_config("gqlsdk.yaml")?;

            assert_eq!(config.function_prefix, "Query");
            assert!(!config.auto_import);
            Ok(())
        });
    }
}
