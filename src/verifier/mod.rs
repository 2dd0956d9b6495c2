//! Result verification for aggregates that cannot be checked by plain equality.
//!
//! A verifier works in exactly one of two modes:
//!
//! - **Compare**: two independently computed results are judged equivalent
//!   (e.g. after sorting order-dependent output).
//! - **Verify**: one result is judged against a baseline the verifier derives
//!   from the input (e.g. an exact distinct count for an approximate one).
//!
//! [`ResultVerifier`] is an enum over the two modes, so asking a verify-only
//! verifier to compare is not expressible. `initialize` returns an episode
//! object that owns everything captured from the input; dropping the episode
//! resets the verifier, and the verifier itself stays shareable.

mod approx_distinct;
mod transform;

pub use approx_distinct::{
    judge_cardinality, ApproxCardinalityVerifier, CardinalityVerdict, DEFAULT_ERROR_BOUND,
    LARGE_GAP_TOLERANCE, MIN_GROUPS_FOR_TOLERANCE,
};
pub use transform::CanonicalizingTransformVerifier;

use crate::column::RowBatch;
use crate::error::VerifierError;
use crate::expr::AggregateCall;
use crate::plan::PlanExecutor;
use std::sync::Arc;

/// Everything a verifier may capture for one verification episode.
#[derive(Debug, Clone, Copy)]
pub struct VerificationInput<'a> {
    /// Batches the aggregation ran over.
    pub batches: &'a [RowBatch],
    pub grouping_keys: &'a [String],
    pub aggregate: &'a AggregateCall,
    /// Name of the aggregate's column in the result.
    pub output_name: &'a str,
}

/// Verifier that judges two results against each other.
pub trait CompareVerifier: Send + Sync {
    fn initialize(
        &self,
        input: &VerificationInput<'_>,
        executor: &dyn PlanExecutor,
    ) -> Result<Box<dyn CompareEpisode>, VerifierError>;
}

/// State captured by [`CompareVerifier::initialize`].
pub trait CompareEpisode {
    /// Whether `result` and `alt_result` are equivalent.
    fn compare(
        &self,
        result: &RowBatch,
        alt_result: &RowBatch,
        executor: &dyn PlanExecutor,
    ) -> Result<bool, VerifierError>;
}

/// Verifier that judges a single result against a derived baseline.
pub trait BaselineVerifier: Send + Sync {
    fn initialize(
        &self,
        input: &VerificationInput<'_>,
        executor: &dyn PlanExecutor,
    ) -> Result<Box<dyn VerifyEpisode>, VerifierError>;
}

/// State captured by [`BaselineVerifier::initialize`].
pub trait VerifyEpisode {
    /// Whether `result` is acceptable given the captured baseline.
    fn verify(&self, result: &RowBatch, executor: &dyn PlanExecutor)
        -> Result<bool, VerifierError>;
}

/// A registered result verifier.
#[derive(Clone)]
pub enum ResultVerifier {
    Compare(Arc<dyn CompareVerifier>),
    Verify(Arc<dyn BaselineVerifier>),
}

impl ResultVerifier {
    pub fn compare(verifier: impl CompareVerifier + 'static) -> Self {
        ResultVerifier::Compare(Arc::new(verifier))
    }

    pub fn verify(verifier: impl BaselineVerifier + 'static) -> Self {
        ResultVerifier::Verify(Arc::new(verifier))
    }

    pub fn supports_compare(&self) -> bool {
        matches!(self, ResultVerifier::Compare(_))
    }

    pub fn supports_verify(&self) -> bool {
        matches!(self, ResultVerifier::Verify(_))
    }
}

impl std::fmt::Debug for ResultVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultVerifier::Compare(_) => f.write_str("ResultVerifier::Compare(..)"),
            ResultVerifier::Verify(_) => f.write_str("ResultVerifier::Verify(..)"),
        }
    }
}
