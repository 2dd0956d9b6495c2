//! Inputs for `min(x, n)`, `max(x, n)`, `min_by(x, y, n)` and `max_by(x, y, n)`.

use super::{expect_type, FixedParam, InputGenerator};
use crate::column::Column;
use crate::error::GeneratorError;
use crate::source::ValueSource;
use crate::types::{DataType, Value};
use rand::{Rng, RngCore};
use std::ops::RangeInclusive;

/// Range `n` is drawn from.
pub const N_RANGE: RangeInclusive<i64> = 0..=9_999;

/// Aggregates taking a "keep the top `n` values" argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopNFunction {
    Min,
    Max,
    MinBy,
    MaxBy,
}

impl TopNFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(TopNFunction::Min),
            "max" => Some(TopNFunction::Max),
            "min_by" => Some(TopNFunction::MinBy),
            "max_by" => Some(TopNFunction::MaxBy),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TopNFunction::Min => "min",
            TopNFunction::Max => "max",
            TopNFunction::MinBy => "min_by",
            TopNFunction::MaxBy => "max_by",
        }
    }

    /// Zero-based position of the `n` argument.
    pub fn n_position(&self) -> usize {
        match self {
            TopNFunction::Min | TopNFunction::Max => 1,
            TopNFunction::MinBy | TopNFunction::MaxBy => 2,
        }
    }
}

/// Keeps `n` constant across all batches of an iteration so results of
/// different batches stay comparable.
#[derive(Debug)]
pub struct TopNParameterGenerator {
    function: TopNFunction,
    n: FixedParam<i64>,
}

impl TopNParameterGenerator {
    pub fn new(function: TopNFunction) -> Self {
        Self {
            function,
            n: FixedParam::Unset,
        }
    }

    pub fn for_function(name: &str) -> Result<Self, GeneratorError> {
        TopNFunction::from_name(name)
            .map(Self::new)
            .ok_or_else(|| GeneratorError::UnknownFunction(name.to_string()))
    }

    /// The `n` chosen for the current iteration, if any.
    pub fn current_n(&self) -> Option<i64> {
        self.n.get().copied()
    }
}

impl InputGenerator for TopNParameterGenerator {
    fn generate(
        &mut self,
        arg_types: &[DataType],
        source: &mut dyn ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<Column>>, GeneratorError> {
        let position = self.function.n_position();
        if arg_types.len() <= position {
            return Ok(None);
        }
        if arg_types.len() > position + 1 {
            return Err(GeneratorError::UnexpectedArity {
                function: self.function.name().to_string(),
                max: position + 1,
                actual: arg_types.len(),
            });
        }
        expect_type(self.function.name(), arg_types, position, "BIGINT", DataType::is_bigint)?;

        let function = self.function;
        let n = self.n.get_or_draw(|| {
            let n = rng.gen_range(N_RANGE);
            tracing::debug!(function = function.name(), n, "fixed top-n parameter");
            n
        });

        let size = source.batch_size();
        let mut columns: Vec<Column> = arg_types[..position]
            .iter()
            .map(|ty| source.fuzz(ty, rng))
            .collect();
        columns.push(Column::constant(DataType::Bigint, Value::Bigint(n), size));
        Ok(Some(columns))
    }

    fn reset(&mut self) {
        self.n.reset();
    }
}
