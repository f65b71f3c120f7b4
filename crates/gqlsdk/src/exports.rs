//! Export surface
//!
//! Every SDK method gets a prefixed top level function (`Launches` becomes `GqlLaunches`) that
//! forwards to the `useGql` accessor of the client owning the operation. This module renders the
//! module exporting those functions, its ambient declarations and the descriptors used to auto
//! import them.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::operations::OperationRegistry;
use crate::rewrite::upper_first;

/// Virtual module the functions are exported from
pub const EXPORT_MODULE: &str = "#build/gql";

#[allow(clippy::expect_used)]
static SDK_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\(variables").expect("regex pattern compiles"));

/// A symbol to inject into consuming code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDescriptor {
    pub name: String,
    #[serde(rename = "as")]
    pub alias: String,
    pub from: String,
}

/// The names of the SDK methods, sorted and deduplicated.
///
/// A method is an identifier immediately followed by an argument list starting with
/// `variables`, which is how the codegen engine declares them.
pub fn sdk_functions(source: &str) -> Vec<String> {
    let mut functions: Vec<String> = SDK_FUNCTION
        .captures_iter(source)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .collect();
    functions.sort();
    functions.dedup();
    functions
}

/// Renders the export surface of a set of SDK methods
#[derive(Debug, Clone, Copy)]
pub struct ExportSurface<'a> {
    functions: &'a [String],
    prefix: &'a str,
    clients: &'a [String],
    registry: &'a OperationRegistry,
}

impl<'a> ExportSurface<'a> {
    pub fn new(
        functions: &'a [String],
        prefix: &'a str,
        clients: &'a [String],
        registry: &'a OperationRegistry,
    ) -> Self {
        Self {
            functions,
            prefix,
            clients,
            registry,
        }
    }

    /// The exported symbol of an SDK method
    pub fn symbol(&self, function: &str) -> String {
        format!("{}{}", self.prefix, upper_first(function))
    }

    /// The client that has to serve an SDK method.
    ///
    /// Calls are only scoped when several clients are configured, a lone client is always the
    /// default one.
    pub fn owner(&self, function: &str) -> Option<&'a str> {
        if self.clients.len() < 2 {
            return None;
        }
        self.clients
            .iter()
            .find(|client| self.registry.contains(client, function))
            .map(String::as_str)
    }

    /// The module exporting one function per SDK method
    pub fn imports(&self) -> String {
        let mut lines = vec!["import { useGql } from '#imports'".to_string()];
        lines.extend(self.functions.iter().map(|function| {
            let accessor = match self.owner(function) {
                Some(client) => format!("useGql('{client}')"),
                None => "useGql()".to_string(),
            };
            format!(
                "export const {} = (...params) => {accessor}['{function}'](...params)",
                self.symbol(function)
            )
        }));
        lines.join("\n")
    }

    /// The ambient declarations typing the exported functions
    pub fn declarations(&self) -> String {
        let mut lines = vec![
            format!("declare module '{EXPORT_MODULE}' {{"),
            format!("  type GqlClients = '{}'", self.clients.join("' | '")),
            "  type GqlFunc = ReturnType<typeof import('#imports')['useGql']>".to_string(),
        ];
        lines.extend(self.functions.iter().map(|function| {
            format!(
                "  export const {}: (...params: Parameters<GqlFunc['{function}']>) => ReturnType<GqlFunc['{function}']>",
                self.symbol(function)
            )
        }));
        lines.push("}".to_string());
        lines.join("\n")
    }

    /// The auto import entries of the exported functions
    pub fn descriptors(&self) -> Vec<ExportDescriptor> {
        self.functions
            .iter()
            .map(|function| {
                let name = self.symbol(function);
                ExportDescriptor {
                    alias: name.clone(),
                    name,
                    from: EXPORT_MODULE.to_string(),
                }
            })
            .collect()
    }
}
