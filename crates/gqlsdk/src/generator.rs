//! SDK generation
//!
//! One generation pass discovers the documents, routes their operations to clients, runs the
//! codegen engine, strips the client prefixes from the SDK and renders the export surface. A pass
//! reads nothing but its inputs and the documents, so it can be re-run from scratch whenever a
//! document changes.

use std::path::PathBuf;
use std::sync::Arc;

use bon::bon;
use tracing::{debug, info, warn};

use crate::artifacts::Artifacts;
use crate::client::Clients;
use crate::codegen::{CodegenEngine, CodegenRequest};
use crate::errors::GenerateError;
use crate::exports::{ExportSurface, sdk_functions};
use crate::operations::{ClientAttributor, OperationRegistry, operation_names};
use crate::rewrite::rewrite;

/// Default prefix of the exported functions
pub const DEFAULT_FUNCTION_PREFIX: &str = "Gql";

/// Generates the SDK and its export surface for a set of clients and documents
pub struct Generator {
    clients: Clients,
    roots: Vec<PathBuf>,
    engine: Arc<dyn CodegenEngine>,
    function_prefix: String,
    only_operation_types: bool,
    silent: bool,
}

#[bon]
impl Generator {
    #[builder]
    pub fn new(
        clients: Clients,
        roots: Vec<PathBuf>,
        engine: Arc<dyn CodegenEngine>,
        #[builder(default = DEFAULT_FUNCTION_PREFIX.to_string())] function_prefix: String,
        #[builder(default = true)] only_operation_types: bool,
        #[builder(default = true)] silent: bool,
    ) -> Self {
        let roots = roots
            .into_iter()
            .filter(|root| {
                let exists = root.exists();
                if !exists {
                    warn!("Invalid document path: {}", root.display());
                }
                exists
            })
            .collect();

        Self {
            clients,
            roots,
            engine,
            function_prefix,
            only_operation_types,
            silent,
        }
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// The document roots that exist and are searched
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Runs a full generation pass.
    ///
    /// Either every artifact is produced or the pass fails; nothing is cached between passes.
    pub async fn generate(&self) -> Result<Artifacts, GenerateError> {
        let documents = gqlsdk_documents::discover(&self.roots)?;
        info!(
            documents = documents.len(),
            clients = self.clients.len(),
            "Generating GraphQL SDK"
        );

        let registry = self.scan(&documents).await?;

        let request = CodegenRequest::new(
            &self.clients,
            documents,
            self.only_operation_types,
            self.silent,
        );
        let generated = self.engine.generate(&request).await?;

        let sdk = if self.clients.is_multiple() {
            rewrite(&generated, &registry)
        } else {
            generated
        };

        let functions = sdk_functions(&sdk);
        let clients: Vec<String> = self.clients.ids().map(str::to_string).collect();
        let surface = ExportSurface::new(&functions, &self.function_prefix, &clients, &registry);
        debug!(functions = functions.len(), "Rendering export surface");

        Ok(Artifacts {
            imports: surface.imports(),
            declarations: surface.declarations(),
            descriptors: surface.descriptors(),
            sdk,
            registry,
        })
    }

    /// Reads the documents one after the other and routes their operations.
    ///
    /// Documents are attributed in discovery order, so the first document declaring an
    /// operation registers it.
    async fn scan(&self, documents: &[PathBuf]) -> Result<OperationRegistry, GenerateError> {
        let mut registry = OperationRegistry::new(self.clients.ids());
        let attributor = ClientAttributor::new(self.clients.ids());

        for path in documents {
            let source = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| GenerateError::ReadDocument {
                    path: path.clone(),
                    source,
                })?;
            let operations = operation_names(&source, path)?;
            let unroutable = attributor.attribute(&mut registry, path, &operations);
            debug!(
                path = %path.display(),
                operations = operations.len(),
                unroutable = unroutable.len(),
                "Scanned document"
            );
        }

        Ok(registry)
    }
}
