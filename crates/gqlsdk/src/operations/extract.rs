use std::path::Path;

use apollo_compiler::{ast::Definition, parser::Parser};
use tracing::warn;

use crate::errors::OperationError;

/// Parses a GraphQL document and returns the names of its executable definitions in
/// declaration order.
///
/// Fragment names are returned alongside query, mutation and subscription names since generated
/// fragment types carry client prefixes too. Type system definitions are skipped.
///
/// # Errors
///
/// Fails on syntax errors and on operations without a name.
pub fn operation_names(
    source_text: &str,
    source_path: &Path,
) -> Result<Vec<String>, OperationError> {
    let document = Parser::new()
        .parse_ast(source_text, source_path)
        .map_err(|e| OperationError::GraphQLDocument(Box::new(e)))?;

    let mut names = Vec::new();
    for definition in &document.definitions {
        match definition {
            Definition::OperationDefinition(operation) => {
                let name = operation
                    .name
                    .as_ref()
                    .ok_or_else(|| OperationError::MissingName {
                        source_path: source_path.to_path_buf(),
                        operation: operation.serialize().no_indent().to_string(),
                    })?;
                names.push(name.to_string());
            }
            Definition::FragmentDefinition(fragment) => names.push(fragment.name.to_string()),
            _ => warn!(
                path = %source_path.display(),
                "Schema definitions were passed in, but only operations and fragments are allowed"
            ),
        }
    }

    Ok(names)
}
