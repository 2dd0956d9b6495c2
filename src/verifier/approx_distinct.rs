//! Verify `approx_distinct(x[, e])` against `count(distinct x)`.
//!
//! For each group the relative gap between the estimate and the exact count
//! is measured. Gaps above `2 * e` are unusual but expected now and then, so
//! they are logged and counted rather than failing immediately:
//!
//! - with at least [`MIN_GROUPS_FOR_TOLERANCE`] groups, up to
//!   [`LARGE_GAP_TOLERANCE`] large gaps are accepted;
//! - with fewer groups, none are.
//!
//! An estimate that is non-zero where the exact count is zero always fails.

use super::{BaselineVerifier, VerificationInput, VerifyEpisode};
use crate::column::RowBatch;
use crate::error::VerifierError;
use crate::expr::{AggregateCall, Expr};
use crate::plan::{NamedAggregate, PlanExecutor, PlanNode, Projection};
use crate::types::Value;

/// Standard error assumed when the call has no error-bound argument.
pub const DEFAULT_ERROR_BOUND: f64 = 0.023;

/// Group count from which a few large gaps are tolerated.
pub const MIN_GROUPS_FOR_TOLERANCE: usize = 50;

/// Large gaps tolerated once there are enough groups. Deviations beyond two
/// standard errors are expected in under 5% of groups.
pub const LARGE_GAP_TOLERANCE: usize = 3;

const LABEL_COLUMN: &str = "label";
const PIVOT_COLUMN: &str = "m";
const ACTUAL_LABEL: &str = "actual";
const EXPECTED_LABEL: &str = "expected";

/// Outcome of comparing estimated against exact counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalityVerdict {
    pub groups: usize,
    /// Relative gaps larger than twice the error bound.
    pub large_gaps: Vec<f64>,
    /// Estimate reported for a group whose exact count is zero.
    pub fabricated: Option<i64>,
}

impl CardinalityVerdict {
    pub fn passed(&self) -> bool {
        if self.fabricated.is_some() {
            return false;
        }
        if self.groups >= MIN_GROUPS_FOR_TOLERANCE {
            self.large_gaps.len() <= LARGE_GAP_TOLERANCE
        } else {
            self.large_gaps.is_empty()
        }
    }
}

/// Judge `(actual, expected)` count pairs, one per group.
///
/// Stops at the first group where the exact count is zero but the estimate
/// is not.
pub fn judge_cardinality(
    pairs: impl IntoIterator<Item = (i64, i64)>,
    error_bound: f64,
) -> CardinalityVerdict {
    let mut verdict = CardinalityVerdict {
        groups: 0,
        large_gaps: Vec::new(),
        fabricated: None,
    };

    for (actual, expected) in pairs {
        verdict.groups += 1;
        if actual == expected {
            continue;
        }

        if expected > 0 {
            let gap = actual.abs_diff(expected) as f64 / expected as f64;
            if gap > 2.0 * error_bound {
                tracing::warn!(
                    error_bound,
                    gap,
                    actual,
                    expected,
                    "approx_distinct is more than 2 stddev away from count(distinct); \
                     unusual, but not necessarily a bug"
                );
                verdict.large_gaps.push(gap);
            }
        } else {
            tracing::error!(
                error_bound,
                actual,
                "count(distinct) returned 0, but approx_distinct did not"
            );
            verdict.fabricated = Some(actual);
            break;
        }
    }

    verdict
}

/// Checks approximate distinct counts against an exact baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxCardinalityVerifier;

impl ApproxCardinalityVerifier {
    pub fn new() -> Self {
        Self
    }
}

fn column_argument<'a>(
    aggregate: &'a AggregateCall,
    position: usize,
    argument: &'static str,
) -> Result<&'a str, VerifierError> {
    let arg = aggregate
        .args
        .get(position)
        .ok_or_else(|| VerifierError::MissingArgument {
            function: aggregate.function.clone(),
            argument,
        })?;
    arg.as_column()
        .ok_or_else(|| VerifierError::NotAColumnReference {
            function: aggregate.function.clone(),
            position,
        })
}

/// `count(distinct x)`, keeping the aggregate's filter.
fn count_distinct_call(aggregate: &AggregateCall) -> Result<AggregateCall, VerifierError> {
    let input = column_argument(aggregate, 0, "value")?;
    let mut call = AggregateCall::new("count", vec![Expr::column(input)]).with_distinct(true);
    call.mask = aggregate.mask.clone();
    Ok(call)
}

/// The error bound the estimate was computed with.
fn extract_error_bound(
    aggregate: &AggregateCall,
    batches: &[RowBatch],
) -> Result<f64, VerifierError> {
    if aggregate.args.len() == 1 {
        return Ok(DEFAULT_ERROR_BOUND);
    }

    let name = column_argument(aggregate, 1, "error bound")?;
    let first = batches.first().ok_or(VerifierError::EmptyInput)?;
    let column = first
        .column(name)
        .ok_or_else(|| VerifierError::MissingColumn(name.to_string()))?;
    let value = column.value_at(0);
    value
        .and_then(Value::as_double)
        .ok_or_else(|| VerifierError::UnexpectedValue {
            column: name.to_string(),
            value: value.map_or_else(|| Value::Null.to_string(), Value::to_string),
            expected: "DOUBLE",
        })
}

impl BaselineVerifier for ApproxCardinalityVerifier {
    fn initialize(
        &self,
        input: &VerificationInput<'_>,
        executor: &dyn PlanExecutor,
    ) -> Result<Box<dyn VerifyEpisode>, VerifierError> {
        if input.batches.is_empty() {
            return Err(VerifierError::EmptyInput);
        }

        let count_distinct = count_distinct_call(input.aggregate)?;
        let error_bound = extract_error_bound(input.aggregate, input.batches)?;

        let plan = PlanNode::values(input.batches.to_vec()).aggregate(
            input.grouping_keys.to_vec(),
            vec![NamedAggregate::new(count_distinct, input.output_name)],
        );
        let expected = executor.execute(&plan)?;
        tracing::debug!(
            groups = expected.num_rows(),
            error_bound,
            "computed count(distinct) baseline"
        );

        Ok(Box::new(CardinalityEpisode {
            expected,
            grouping_keys: input.grouping_keys.to_vec(),
            output_name: input.output_name.to_string(),
            error_bound,
        }))
    }
}

struct CardinalityEpisode {
    expected: RowBatch,
    grouping_keys: Vec<String>,
    output_name: String,
    error_bound: f64,
}

impl CardinalityEpisode {
    fn labeled(&self, data: &RowBatch, label: &str) -> PlanNode {
        let mut projections: Vec<Projection> = self
            .grouping_keys
            .iter()
            .map(|key| Projection::column(key))
            .collect();
        projections.push(Projection::column(&self.output_name));
        projections.push(Projection::new(Expr::literal(label), LABEL_COLUMN));
        PlanNode::values(vec![data.clone()]).project(projections)
    }

    /// Union actual and expected, group by the grouping keys and pivot the
    /// two labeled counts into `(a, e)` columns. A join would drop groups
    /// whose keys are null.
    fn pivot_plan(&self, result: &RowBatch) -> PlanNode {
        let pivot = NamedAggregate::new(
            AggregateCall::new(
                "map_agg",
                vec![Expr::column(LABEL_COLUMN), Expr::column(&self.output_name)],
            ),
            PIVOT_COLUMN,
        );
        let side = |label: &str| {
            Expr::subscript(Expr::column(PIVOT_COLUMN), Expr::literal(label))
        };

        PlanNode::Union(vec![
            self.labeled(&self.expected, EXPECTED_LABEL),
            self.labeled(result, ACTUAL_LABEL),
        ])
        .aggregate(self.grouping_keys.clone(), vec![pivot])
        .project(vec![
            Projection::new(side(ACTUAL_LABEL), "a"),
            Projection::new(side(EXPECTED_LABEL), "e"),
        ])
    }
}

fn count_at(combined: &RowBatch, index: usize, row: usize) -> Result<i64, VerifierError> {
    let side = if index == 0 { ACTUAL_LABEL } else { EXPECTED_LABEL };
    combined
        .column_at(index)
        .and_then(|c| c.value_at(row))
        .and_then(Value::as_bigint)
        .ok_or(VerifierError::MissingGroupValue { row, side })
}

impl VerifyEpisode for CardinalityEpisode {
    fn verify(
        &self,
        result: &RowBatch,
        executor: &dyn PlanExecutor,
    ) -> Result<bool, VerifierError> {
        let combined = executor.execute(&self.pivot_plan(result))?;

        let groups = result.num_rows();
        if combined.num_rows() != groups {
            return Err(VerifierError::GroupCountMismatch {
                result: groups,
                combined: combined.num_rows(),
            });
        }

        let pairs = (0..groups)
            .map(|row| -> Result<(i64, i64), VerifierError> {
                Ok((count_at(&combined, 0, row)?, count_at(&combined, 1, row)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let verdict = judge_cardinality(pairs, self.error_bound);
        if !verdict.large_gaps.is_empty() {
            tracing::warn!(
                groups = verdict.groups,
                large_gaps = verdict.large_gaps.len(),
                "groups outside 2 stddev"
            );
        }
        Ok(verdict.passed())
    }
}
