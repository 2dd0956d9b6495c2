//! Error types for generators and verifiers.

use crate::types::DataType;
use thiserror::Error;

/// Errors raised by input generators.
///
/// Every variant is a contract violation: the argument types handed to the
/// generator disagree with what the function is known to accept. An
/// argument shape the generator does not handle at all is not an error;
/// `generate` returns `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("{function}: unexpected type {actual} at argument {position}, expected {expected}")]
    UnexpectedType {
        function: String,
        position: usize,
        expected: &'static str,
        actual: DataType,
    },

    #[error("{function}: unexpected number of arguments {actual}, expected at most {max}")]
    UnexpectedArity {
        function: String,
        max: usize,
        actual: usize,
    },

    #[error("{function}: missing {argument} argument")]
    MissingArgument {
        function: String,
        argument: &'static str,
    },

    #[error("unexpected function name: {0}")]
    UnknownFunction(String),
}

/// Errors raised while initializing or running a result verifier.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("transform template '{template}' must have exactly one placeholder, found {placeholders}")]
    InvalidTemplate {
        template: String,
        placeholders: usize,
    },

    #[error("argument {position} of {function} is not a column reference")]
    NotAColumnReference { function: String, position: usize },

    #[error("{function} has no {argument} argument")]
    MissingArgument {
        function: String,
        argument: &'static str,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("verification requires at least one input batch")]
    EmptyInput,

    #[error("column '{column}' holds unexpected value {value}, expected {expected}")]
    UnexpectedValue {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("result has {result} groups but the actual/expected pivot has {combined}")]
    GroupCountMismatch { result: usize, combined: usize },

    #[error("group {row} is missing its {side} value")]
    MissingGroupValue { row: usize, side: &'static str },

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}
