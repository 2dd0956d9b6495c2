//! Constrained input generation and result verification for fuzzing
//! aggregate functions.
//!
//! A differential aggregation fuzzer runs the same aggregate over random
//! input on two engines and compares the results. That breaks down for
//! functions whose arguments are constrained, or whose results are order
//! dependent or approximate. This crate supplies the two missing pieces:
//!
//! - [`InputGenerator`]s produce argument columns that respect a function's
//!   contract, keeping parameters such as `n` in `min(x, n)` fixed for a
//!   whole fuzzing [`Iteration`].
//! - [`ResultVerifier`]s decide whether results are acceptable, either by
//!   comparing two results after a canonicalizing transform or by checking
//!   one result against an exactly computed baseline.
//!
//! [`VerificationRegistry::standard`] wires both to function names. Plans
//! the verifiers need are executed through a caller-supplied
//! [`PlanExecutor`].
//!
//! ```
//! use aggfuzz_verify::{DataType, FuzzerOptions, GeneratorError, VerificationRegistry};
//!
//! fn main() -> Result<(), GeneratorError> {
//!     let mut registry = VerificationRegistry::standard();
//!     let options = FuzzerOptions::minimal();
//!     let mut rng = options.rng();
//!     let mut source = options.value_source();
//!
//!     if let Some(mut iteration) = registry.iteration("min") {
//!         let types = [DataType::Double, DataType::Bigint];
//!         let columns = iteration.generate(&types, &mut source, &mut rng)?;
//!         assert_eq!(columns.map(|c| c.len()), Some(2));
//!     }
//!     Ok(())
//! }
//! ```

mod column;
mod config;
mod error;
mod expr;
pub mod generator;
mod plan;
mod registry;
mod source;
mod types;
pub mod verifier;

pub use column::{BatchError, Column, RowBatch};
pub use config::FuzzerOptions;
pub use error::{GeneratorError, VerifierError};
pub use expr::{AggregateCall, Expr, ExprTemplate};
pub use generator::{FixedParam, InputGenerator, Iteration};
pub use plan::{NamedAggregate, PlanExecutor, PlanNode, Projection};
pub use registry::{transform, Verification, VerificationRegistry, CANONICALIZE};
pub use source::{UniformValueSource, ValueSource};
pub use types::{DataType, Value};
pub use verifier::{
    ApproxCardinalityVerifier, BaselineVerifier, CanonicalizingTransformVerifier, CompareEpisode,
    CompareVerifier, ResultVerifier, VerificationInput, VerifyEpisode,
};
