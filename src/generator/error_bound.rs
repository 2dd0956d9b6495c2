//! Inputs for `approx_distinct(x, e)` and `approx_set(x, e)`.

use super::{expect_type, FixedParam, InputGenerator};
use crate::column::Column;
use crate::error::GeneratorError;
use crate::source::ValueSource;
use crate::types::{DataType, Value};
use rand::{Rng, RngCore};

/// Smallest maximum standard error the estimator accepts.
pub const MIN_ERROR_BOUND: f64 = 0.0040625;
/// Largest maximum standard error the estimator accepts.
pub const MAX_ERROR_BOUND: f64 = 0.26;

/// Draws the maximum standard error `e` from the estimator's supported
/// range, once per iteration.
#[derive(Debug)]
pub struct ErrorBoundGenerator {
    function: String,
    error_bound: FixedParam<f64>,
}

impl ErrorBoundGenerator {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            error_bound: FixedParam::Unset,
        }
    }

    pub fn current_error_bound(&self) -> Option<f64> {
        self.error_bound.get().copied()
    }
}

fn draw_error_bound(rng: &mut dyn RngCore) -> f64 {
    // Open at both ends: gen_range already excludes the upper bound.
    loop {
        let e = rng.gen_range(MIN_ERROR_BOUND..MAX_ERROR_BOUND);
        if e > MIN_ERROR_BOUND {
            return e;
        }
    }
}

impl InputGenerator for ErrorBoundGenerator {
    fn generate(
        &mut self,
        arg_types: &[DataType],
        source: &mut dyn ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<Column>>, GeneratorError> {
        if arg_types.len() != 2 {
            return Ok(None);
        }
        expect_type(&self.function, arg_types, 1, "DOUBLE", DataType::is_double)?;

        let function = &self.function;
        let e = self.error_bound.get_or_draw(|| {
            let e = draw_error_bound(rng);
            tracing::debug!(function = %function, e, "fixed error bound");
            e
        });

        let size = source.batch_size();
        Ok(Some(vec![
            source.fuzz(&arg_types[0], rng),
            Column::constant(DataType::Double, Value::Double(e), size),
        ]))
    }

    fn reset(&mut self) {
        self.error_bound.reset();
    }
}
