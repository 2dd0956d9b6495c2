//! Unconstrained random column data.

use crate::column::Column;
use crate::types::{DataType, Value};
use rand::{Rng, RngCore};

/// Supplier of unconstrained random columns.
///
/// Generators delegate every argument they do not constrain to a
/// `ValueSource`. The random stream is passed in so that one seeded RNG
/// drives a whole fuzzing iteration.
pub trait ValueSource {
    /// Number of rows in every generated batch.
    fn batch_size(&self) -> usize;

    /// Generate a column of `batch_size()` random values of `data_type`.
    fn fuzz(&mut self, data_type: &DataType, rng: &mut dyn RngCore) -> Column;
}

/// A [`ValueSource`] drawing every value independently and uniformly.
#[derive(Debug, Clone)]
pub struct UniformValueSource {
    batch_size: usize,
    null_ratio: f64,
    max_container_len: usize,
}

impl Default for UniformValueSource {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UniformValueSource {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            null_ratio: 0.0,
            max_container_len: 10,
        }
    }

    /// Fraction of generated values that are null (0.0-1.0).
    pub fn with_null_ratio(mut self, ratio: f64) -> Self {
        self.null_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Upper bound on array, map and string lengths.
    pub fn with_max_container_len(mut self, len: usize) -> Self {
        self.max_container_len = len;
        self
    }

    fn value(&self, data_type: &DataType, rng: &mut dyn RngCore) -> Value {
        if self.null_ratio > 0.0 && rng.gen_bool(self.null_ratio) {
            return Value::Null;
        }
        self.non_null_value(data_type, rng)
    }

    fn non_null_value(&self, data_type: &DataType, rng: &mut dyn RngCore) -> Value {
        match data_type {
            DataType::Boolean => Value::Boolean(rng.gen()),
            DataType::Integer => Value::Integer(rng.gen()),
            DataType::Bigint => Value::Bigint(rng.gen()),
            DataType::Double => Value::Double(rng.gen_range(-1.0e6..1.0e6)),
            DataType::Varchar => {
                let len = rng.gen_range(0..=self.max_container_len);
                Value::Varchar(
                    (0..len)
                        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
                        .collect(),
                )
            }
            DataType::Array(element) => {
                let len = rng.gen_range(0..=self.max_container_len);
                Value::Array((0..len).map(|_| self.value(element, rng)).collect())
            }
            DataType::Map(key, value) => {
                let len = rng.gen_range(0..=self.max_container_len);
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(len);
                for _ in 0..len {
                    // Map keys are never null and never repeat.
                    let entry_key = self.non_null_value(key, rng);
                    if entries.iter().all(|(k, _)| *k != entry_key) {
                        entries.push((entry_key, self.value(value, rng)));
                    }
                }
                Value::Map(entries)
            }
        }
    }
}

impl ValueSource for UniformValueSource {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn fuzz(&mut self, data_type: &DataType, rng: &mut dyn RngCore) -> Column {
        let values = (0..self.batch_size)
            .map(|_| self.value(data_type, rng))
            .collect();
        Column::flat(data_type.clone(), values)
    }
}
