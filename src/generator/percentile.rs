//! Inputs for `approx_percentile(x, [w], percentile(s), [accuracy])`.

use super::{expect_type, FixedParam, InputGenerator};
use crate::column::Column;
use crate::error::GeneratorError;
use crate::source::ValueSource;
use crate::types::{DataType, Value};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::ops::RangeInclusive;

/// Percentiles picked most of the time.
pub const COMMON_PERCENTILES: [f64; 9] = [0.1, 0.25, 0.5, 0.75, 0.90, 0.95, 0.99, 0.999, 0.9999];

/// Probability of drawing a percentile uniformly from `[0, 1]` instead of
/// picking one of [`COMMON_PERCENTILES`].
const UNIFORM_PERCENTILE_PROBABILITY: f64 = 0.1;

const WEIGHT_RANGE: RangeInclusive<i64> = 1..=1_000;

/// Number of percentiles generated for an array-typed percentile argument.
const PERCENTILE_ARRAY_LEN: usize = 3;

const FUNCTION: &str = "approx_percentile";

/// Generates positive weights, and keeps the percentile(s) and accuracy
/// fixed for the whole iteration.
#[derive(Debug, Default)]
pub struct PercentileGenerator {
    percentile: FixedParam<f64>,
    percentiles: FixedParam<[f64; PERCENTILE_ARRAY_LEN]>,
    accuracy: FixedParam<f64>,
}

impl PercentileGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn pick_percentile(rng: &mut dyn RngCore) -> f64 {
    if rng.gen_bool(UNIFORM_PERCENTILE_PROBABILITY) {
        return rng.gen::<f64>();
    }
    *COMMON_PERCENTILES
        .choose(rng)
        .unwrap_or(&COMMON_PERCENTILES[0])
}

fn is_double_array(ty: &DataType) -> bool {
    ty.element_type().is_some_and(DataType::is_double)
}

impl InputGenerator for PercentileGenerator {
    fn generate(
        &mut self,
        arg_types: &[DataType],
        source: &mut dyn ValueSource,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<Column>>, GeneratorError> {
        if arg_types.len() < 2 {
            return Ok(None);
        }

        let size = source.batch_size();
        let mut columns = Vec::with_capacity(arg_types.len());
        columns.push(source.fuzz(&arg_types[0], rng));

        let weighted = arg_types[1].is_bigint();
        if weighted {
            let weights = (0..size)
                .map(|_| Value::Bigint(rng.gen_range(WEIGHT_RANGE)))
                .collect();
            columns.push(Column::flat(DataType::Bigint, weights));
        }

        let percentile_index = if weighted { 2 } else { 1 };
        let percentile_type = arg_types
            .get(percentile_index)
            .ok_or_else(|| GeneratorError::MissingArgument {
                function: FUNCTION.to_string(),
                argument: "percentile",
            })?;

        if percentile_type.is_double() {
            let p = self.percentile.get_or_draw(|| {
                let p = pick_percentile(rng);
                tracing::debug!(function = FUNCTION, percentile = p, "fixed percentile");
                p
            });
            columns.push(Column::constant(DataType::Double, Value::Double(p), size));
        } else {
            expect_type(
                FUNCTION,
                arg_types,
                percentile_index,
                "DOUBLE or ARRAY(DOUBLE)",
                is_double_array,
            )?;
            let ps = self.percentiles.get_or_draw(|| {
                let ps = [
                    pick_percentile(rng),
                    pick_percentile(rng),
                    pick_percentile(rng),
                ];
                tracing::debug!(function = FUNCTION, percentiles = ?ps, "fixed percentiles");
                ps
            });
            let array = Value::Array(ps.iter().map(|p| Value::Double(*p)).collect());
            columns.push(Column::constant(
                DataType::array(DataType::Double),
                array,
                size,
            ));
        }

        if arg_types.len() > percentile_index + 2 {
            return Err(GeneratorError::UnexpectedArity {
                function: FUNCTION.to_string(),
                max: percentile_index + 2,
                actual: arg_types.len(),
            });
        }
        if arg_types.len() == percentile_index + 2 {
            let accuracy_index = percentile_index + 1;
            expect_type(FUNCTION, arg_types, accuracy_index, "DOUBLE", DataType::is_double)?;
            let accuracy = self.accuracy.get_or_draw(|| rng.gen::<f64>());
            columns.push(Column::constant(
                DataType::Double,
                Value::Double(accuracy),
                size,
            ));
        }

        Ok(Some(columns))
    }

    fn reset(&mut self) {
        self.percentile.reset();
        self.percentiles.reset();
        self.accuracy.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::UniformValueSource;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn generate(generator: &mut PercentileGenerator, types: &[DataType]) -> Vec<Column> {
        let mut source = UniformValueSource::new(16);
        let mut rng = SmallRng::seed_from_u64(9);
        generator
            .generate(types, &mut source, &mut rng)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_unweighted_scalar_percentile() {
        let mut generator = PercentileGenerator::new();
        let columns = generate(&mut generator, &[DataType::Double, DataType::Double]);
        assert_eq!(columns.len(), 2);
        let p = columns[1].constant_value().and_then(Value::as_double).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_percentile_array_has_three_values() {
        let mut generator = PercentileGenerator::new();
        let columns = generate(
            &mut generator,
            &[DataType::Bigint, DataType::array(DataType::Double)],
        );
        let values = columns[1].constant_value().and_then(Value::as_array).unwrap();
        assert_eq!(values.len(), PERCENTILE_ARRAY_LEN);
        for value in values {
            let p = value.as_double().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_accuracy_argument() {
        let mut generator = PercentileGenerator::new();
        let columns = generate(
            &mut generator,
            &[
                DataType::Double,
                DataType::Bigint,
                DataType::Double,
                DataType::Double,
            ],
        );
        assert_eq!(columns.len(), 4);
        let accuracy = columns[3].constant_value().and_then(Value::as_double).unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }

    #[test]
    fn test_invalid_percentile_type_fails_fast() {
        let mut generator = PercentileGenerator::new();
        let mut source = UniformValueSource::new(4);
        let mut rng = SmallRng::seed_from_u64(9);
        let err = generator
            .generate(&[DataType::Double, DataType::Varchar], &mut source, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::UnexpectedType { position: 1, .. }));
    }

    #[test]
    fn test_missing_percentile_after_weight() {
        let mut generator = PercentileGenerator::new();
        let mut source = UniformValueSource::new(4);
        let mut rng = SmallRng::seed_from_u64(9);
        let err = generator
            .generate(&[DataType::Double, DataType::Bigint], &mut source, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MissingArgument { .. }));
    }

    #[test]
    fn test_pick_percentile_mostly_common() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let common = (0..1000)
            .map(|_| pick_percentile(&mut rng))
            .filter(|p| COMMON_PERCENTILES.contains(p))
            .count();
        // About 900 expected; allow for variance.
        assert!(common > 820 && common < 970, "common = {}", common);
    }
}
