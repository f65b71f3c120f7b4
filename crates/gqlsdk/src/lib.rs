pub mod artifacts;
pub mod client;
pub mod codegen;
pub mod errors;
pub mod exports;
pub mod generator;
pub mod operations;
pub mod regenerate;
pub mod rewrite;
