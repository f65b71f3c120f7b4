//! Codegen engine
//!
//! The TypeScript SDK itself is produced by an external codegen engine. [`CommandCodegen`] drives
//! the `graphql-codegen` command line tool, other engines can be plugged in through
//! [`CodegenEngine`].

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::{Map, Value, json};
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::client::Clients;
use crate::errors::CodegenError;

/// Name of the generated SDK file
pub const SDK_FILE: &str = "gql-sdk.ts";

/// A `graphql-codegen` plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plugin {
    Typescript,
    TypescriptOperations,
    TypescriptGraphqlRequest,
}

impl Plugin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plugin::Typescript => "typescript",
            Plugin::TypescriptOperations => "typescript-operations",
            Plugin::TypescriptGraphqlRequest => "typescript-graphql-request",
        }
    }

    /// The plugins needed for a set of documents. Without documents only schema types can be
    /// generated.
    pub fn for_documents(documents: &[PathBuf]) -> Vec<Plugin> {
        if documents.is_empty() {
            vec![Plugin::Typescript]
        } else {
            vec![
                Plugin::Typescript,
                Plugin::TypescriptOperations,
                Plugin::TypescriptGraphqlRequest,
            ]
        }
    }
}

/// A schema the SDK is generated against
#[derive(Debug, Clone)]
pub struct SchemaEndpoint {
    pub host: Url,
    pub token: Option<SecretString>,
}

/// Everything the codegen engine needs to produce the SDK of one generation pass
#[derive(Debug, Clone)]
pub struct CodegenRequest {
    pub schemas: Vec<SchemaEndpoint>,
    pub plugins: Vec<Plugin>,
    pub documents: Vec<PathBuf>,
    pub only_operation_types: bool,
    pub silent: bool,
    pub file: String,
}

impl CodegenRequest {
    pub fn new(
        clients: &Clients,
        documents: Vec<PathBuf>,
        only_operation_types: bool,
        silent: bool,
    ) -> Self {
        Self {
            schemas: clients
                .iter()
                .map(|client| SchemaEndpoint {
                    host: client.host.clone(),
                    token: client.token.clone(),
                })
                .collect(),
            plugins: Plugin::for_documents(&documents),
            documents,
            only_operation_types,
            silent,
            file: SDK_FILE.to_string(),
        }
    }

    /// The `graphql-codegen` configuration for this request, generating into `output`
    pub fn codegen_config(&self, output: &str) -> Value {
        let schema: Vec<Value> = self
            .schemas
            .iter()
            .map(|schema| {
                let mut headers = Map::new();
                if let Some(token) = &schema.token {
                    headers.insert(
                        "Authorization".to_string(),
                        Value::String(format!("Bearer {}", token.expose_secret())),
                    );
                }
                json!({ (schema.host.as_str()): { "headers": headers } })
            })
            .collect();

        json!({
            "schema": schema,
            "documents": self.documents,
            "silent": self.silent,
            "generates": {
                (output): {
                    "plugins": self.plugins.iter().map(Plugin::as_str).collect::<Vec<_>>(),
                    "config": {
                        "skipTypename": true,
                        "useTypeImports": true,
                        "gqlImport": "graphql-request#gql",
                        "onlyOperationTypes": self.only_operation_types,
                        "namingConvention": {
                            "enumValues": "change-case-all#upperCaseFirst"
                        }
                    }
                }
            }
        })
    }
}

/// Produces the SDK source for a request
#[async_trait]
pub trait CodegenEngine: Send + Sync {
    async fn generate(&self, request: &CodegenRequest) -> Result<String, CodegenError>;
}

/// Runs the `graphql-codegen` command line tool
#[derive(Debug, Clone)]
pub struct CommandCodegen {
    command: Vec<String>,
}

impl CommandCodegen {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for CommandCodegen {
    fn default() -> Self {
        Self::new(vec!["npx".to_string(), "graphql-codegen".to_string()])
    }
}

#[async_trait]
impl CodegenEngine for CommandCodegen {
    async fn generate(&self, request: &CodegenRequest) -> Result<String, CodegenError> {
        let (program, args) = self.command.split_first().ok_or(CodegenError::NoCommand)?;
        let command_line = self.command.join(" ");

        let workdir = tempfile::tempdir()?;
        let output = workdir.path().join(&request.file);
        let config_path = workdir.path().join("codegen.json");
        let config = request.codegen_config(&output.to_string_lossy());
        tokio::fs::write(&config_path, serde_json::to_vec_pretty(&config)?).await?;

        debug!(command = %command_line, config = %config_path.display(), "Running codegen");
        let result = Command::new(program)
            .args(args)
            .arg("--config")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(if request.silent {
                Stdio::null()
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CodegenError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(CodegenError::Failed {
                command: command_line,
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let source = tokio::fs::read_to_string(&output).await?;
        info!(
            documents = request.documents.len(),
            bytes = source.len(),
            "Generated GraphQL SDK"
        );
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use secrecy::SecretString;
    use url::Url;

    use super::*;

    fn request(documents: Vec<PathBuf>) -> CodegenRequest {
        CodegenRequest {
            schemas: vec![
                SchemaEndpoint {
                    host: Url::parse("https://api.spacex.land/graphql").unwrap(),
                    token: None,
                },
                SchemaEndpoint {
                    host: Url::parse("https://api.github.com/graphql").unwrap(),
                    token: Some(SecretString::from("ghp_token")),
                },
            ],
            plugins: Plugin::for_documents(&documents),
            documents,
            only_operation_types: true,
            silent: true,
            file: SDK_FILE.to_string(),
        }
    }

    #[test]
    fn it_adds_operation_plugins_with_documents() {
        assert_eq!(Plugin::for_documents(&[]), vec![Plugin::Typescript]);
        assert_eq!(
            Plugin::for_documents(&[PathBuf::from("launches.gql")]),
            vec![
                Plugin::Typescript,
                Plugin::TypescriptOperations,
                Plugin::TypescriptGraphqlRequest
            ]
        );
    }

    #[test]
    fn it_renders_the_codegen_config() {
        let mut config =
            request(vec![PathBuf::from("queries/launches.gql")]).codegen_config("out.ts");
        config.sort_all_objects();

        insta::assert_json_snapshot!(config, @r#"
        {
          "documents": [
            "queries/launches.gql"
          ],
          "generates": {
            "out.ts": {
              "config": {
                "gqlImport": "graphql-request#gql",
                "namingConvention": {
                  "enumValues": "change-case-all#upperCaseFirst"
                },
                "onlyOperationTypes": true,
                "skipTypename": true,
                "useTypeImports": true
              },
              "plugins": [
                "typescript",
                "typescript-operations",
                "typescript-graphql-request"
              ]
            }
          },
          "schema": [
            {
              "https://api.spacex.land/graphql": {
                "headers": {}
              }
            },
            {
              "https://api.github.com/graphql": {
                "headers": {
                  "Authorization": "Bearer ghp_token"
                }
              }
            }
          ],
          "silent": true
        }
        "#);
    }

    #[tokio::test]
    async fn it_requires_a_command() {
        let result = CommandCodegen::new(vec![]).generate(&request(vec![])).await;

        assert!(matches!(result, Err(CodegenError::NoCommand)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn it_reports_failing_commands() {
        let engine = CommandCodegen::new(vec!["false".to_string()]);

        let result = engine.generate(&request(vec![])).await;

        assert!(matches!(result, Err(CodegenError::Failed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn it_reads_back_the_generated_file() {
        // Stands in for graphql-codegen: copies the output path out of the config and writes it
        let script = r#"config="$1"; shift; [ "$config" = "--config" ] || exit 2
out=$(sed -n 's/.*"\(\/[^"]*gql-sdk\.ts\)".*/\1/p' "$1" | head -n 1)
echo 'export const generated = true' > "$out""#;
        let engine = CommandCodegen::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "codegen".to_string(),
        ]);

        let source = engine.generate(&request(vec![])).await.unwrap();

        assert_eq!(source, "export const generated = true\n");
    }
}
