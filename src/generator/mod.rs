//! Constrained argument generation for aggregate functions.
//!
//! Some aggregates only make sense for a narrow slice of their argument
//! space: `min(x, n)` needs the same `n` in every batch of an iteration,
//! `approx_distinct(x, e)` needs `e` inside the estimator's supported range,
//! and so on. An [`InputGenerator`] encodes those rules; every argument it
//! does not constrain is delegated to a [`ValueSource`].

mod error_bound;
mod percentile;
mod top_n;

pub use error_bound::{ErrorBoundGenerator, MAX_ERROR_BOUND, MIN_ERROR_BOUND};
pub use percentile::{PercentileGenerator, COMMON_PERCENTILES};
pub use top_n::{TopNFunction, TopNParameterGenerator, N_RANGE};

use crate::column::Column;
use crate::error::GeneratorError;
use crate::source::ValueSource;
use crate::types::DataType;
use rand::RngCore;

/// Generates argument columns for one aggregate function.
pub trait InputGenerator: Send {
    /// Generate one batch of argument columns for `arg_types`.
    ///
    /// Returns `Ok(None)` when this generator does not apply to the argument
    /// shape; the caller should then fall back to unconstrained generation.
    /// Parameters that must stay fixed within an iteration are drawn on the
    /// first call after construction or [`reset`](InputGenerator::reset)
    /// and reused afterwards.
    fn generate(
        &mut self,
        arg_types: &[DataType],
        source: &mut dyn ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<Column>>, GeneratorError>;

    /// Forget every fixed parameter. Called at iteration boundaries.
    fn reset(&mut self);
}

/// A parameter held constant for the rest of a fuzzing iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedParam<T> {
    Unset,
    Fixed(T),
}

impl<T> Default for FixedParam<T> {
    fn default() -> Self {
        FixedParam::Unset
    }
}

impl<T: Clone> FixedParam<T> {
    /// Return the fixed value, drawing it with `draw` if none is set yet.
    pub fn get_or_draw(&mut self, draw: impl FnOnce() -> T) -> T {
        match self {
            FixedParam::Fixed(value) => value.clone(),
            FixedParam::Unset => {
                let value = draw();
                *self = FixedParam::Fixed(value.clone());
                value
            }
        }
    }
}

impl<T> FixedParam<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            FixedParam::Fixed(value) => Some(value),
            FixedParam::Unset => None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, FixedParam::Fixed(_))
    }

    pub fn reset(&mut self) {
        *self = FixedParam::Unset;
    }
}

/// One fuzzing iteration over a generator.
///
/// The generator is reset when the scope is opened and again when it is
/// dropped, so fixed parameters never leak from one iteration into the next.
pub struct Iteration<'a> {
    generator: &'a mut dyn InputGenerator,
}

impl<'a> Iteration<'a> {
    pub fn new(generator: &'a mut dyn InputGenerator) -> Self {
        generator.reset();
        Self { generator }
    }

    pub fn generate(
        &mut self,
        arg_types: &[DataType],
        source: &mut dyn ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<Column>>, GeneratorError> {
        self.generator.generate(arg_types, source, rng)
    }
}

impl Drop for Iteration<'_> {
    fn drop(&mut self) {
        self.generator.reset();
    }
}

/// Check the declared type at `position`, failing loudly on mismatch.
fn expect_type(
    function: &str,
    arg_types: &[DataType],
    position: usize,
    expected: &'static str,
    matches: impl Fn(&DataType) -> bool,
) -> Result<(), GeneratorError> {
    match arg_types.get(position) {
        Some(actual) if matches(actual) => Ok(()),
        Some(actual) => Err(GeneratorError::UnexpectedType {
            function: function.to_string(),
            position,
            expected,
            actual: actual.clone(),
        }),
        None => Err(GeneratorError::MissingArgument {
            function: function.to_string(),
            argument: expected,
        }),
    }
}
