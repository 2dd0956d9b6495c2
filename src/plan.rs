//! Query plans handed to the external executor.
//!
//! Verifiers never evaluate data themselves. They describe the query they
//! need as a [`PlanNode`] and ask a [`PlanExecutor`] to materialize it.

use crate::column::RowBatch;
use crate::expr::{AggregateCall, Expr};

/// An output column of a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: Expr,
    pub alias: String,
}

impl Projection {
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: alias.into(),
        }
    }

    /// Pass a column through unchanged.
    pub fn column(name: &str) -> Self {
        Self::new(Expr::column(name), name)
    }
}

/// An aggregate with the name of its output column.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAggregate {
    pub call: AggregateCall,
    pub alias: String,
}

impl NamedAggregate {
    pub fn new(call: AggregateCall, alias: impl Into<String>) -> Self {
        Self {
            call,
            alias: alias.into(),
        }
    }
}

/// Logical plan tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// In-memory batches, all with the same columns.
    Values(Vec<RowBatch>),
    Project {
        input: Box<PlanNode>,
        projections: Vec<Projection>,
    },
    /// Single-step aggregation; output columns are the grouping keys
    /// followed by the aggregates.
    Aggregate {
        input: Box<PlanNode>,
        grouping_keys: Vec<String>,
        aggregates: Vec<NamedAggregate>,
    },
    /// Concatenation of inputs with identical output columns.
    Union(Vec<PlanNode>),
}

impl PlanNode {
    pub fn values(batches: Vec<RowBatch>) -> Self {
        PlanNode::Values(batches)
    }

    pub fn project(self, projections: Vec<Projection>) -> Self {
        PlanNode::Project {
            input: Box::new(self),
            projections,
        }
    }

    pub fn aggregate(self, grouping_keys: Vec<String>, aggregates: Vec<NamedAggregate>) -> Self {
        PlanNode::Aggregate {
            input: Box::new(self),
            grouping_keys,
            aggregates,
        }
    }
}

/// Executes a plan and returns the materialized result.
///
/// Called synchronously; any blocking happens inside the executor.
pub trait PlanExecutor {
    fn execute(&self, plan: &PlanNode) -> anyhow::Result<RowBatch>;
}

impl<F> PlanExecutor for F
where
    F: Fn(&PlanNode) -> anyhow::Result<RowBatch>,
{
    fn execute(&self, plan: &PlanNode) -> anyhow::Result<RowBatch> {
        self(plan)
    }
}
