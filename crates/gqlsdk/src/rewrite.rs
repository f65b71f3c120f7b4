//! Client prefix rewriting
//!
//! Operations named `<client>_<Operation>` come out of the codegen engine with the prefix baked
//! into their identifiers, both as written (`spacex_Launches`, the SDK method) and with every
//! underscore separated segment capitalized (`Spacex_LaunchesQuery`, the generated types). This
//! module replaces both forms with the bare operation name.
//!
//! The rewrite is a plain text transform over the machine generated SDK. Every literal occurrence
//! is replaced, so running it twice over the same blob changes nothing the second time.

use crate::operations::OperationRegistry;

/// The identifier of a prefixed operation as written in documents
pub fn snake_name(client: &str, operation: &str) -> String {
    format!("{client}_{operation}")
}

/// Capitalizes the first character of every underscore separated segment
pub fn pascal_like(name: &str) -> String {
    name.split('_')
        .map(upper_first)
        .collect::<Vec<_>>()
        .join("_")
}

pub(crate) fn upper_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strips client prefixes from the identifiers of every registered operation.
///
/// Pairs are applied in registry order.
pub fn rewrite(source: &str, registry: &OperationRegistry) -> String {
    let mut rewritten = source.to_string();

    for (client, operation) in registry.iter() {
        let prefixed = snake_name(client, operation);
        if rewritten.contains(&prefixed) {
            rewritten = rewritten.replace(&prefixed, operation);
        }

        let prefixed = pascal_like(&prefixed);
        if rewritten.contains(&prefixed) {
            rewritten = rewritten.replace(&prefixed, &pascal_like(operation));
        }
    }

    rewritten
}
