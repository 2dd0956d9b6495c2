//! Compare results after a canonicalizing transform.

use super::{CompareEpisode, CompareVerifier, VerificationInput};
use crate::column::RowBatch;
use crate::error::VerifierError;
use crate::expr::{Expr, ExprTemplate};
use crate::plan::{PlanExecutor, PlanNode, Projection};

/// Applies a SQL transform to the aggregate's output before comparing two
/// results, e.g. sorting the array produced by `array_agg`, whose element
/// order depends on input order.
#[derive(Debug, Clone)]
pub struct CanonicalizingTransformVerifier {
    template: ExprTemplate,
}

impl CanonicalizingTransformVerifier {
    pub fn new(template: ExprTemplate) -> Self {
        Self { template }
    }

    /// Build from an expression containing exactly one placeholder.
    pub fn from_expr(expr: Expr) -> Result<Self, VerifierError> {
        ExprTemplate::new(expr).map(Self::new)
    }

    pub fn template(&self) -> &ExprTemplate {
        &self.template
    }
}

impl CompareVerifier for CanonicalizingTransformVerifier {
    fn initialize(
        &self,
        input: &VerificationInput<'_>,
        _executor: &dyn PlanExecutor,
    ) -> Result<Box<dyn CompareEpisode>, VerifierError> {
        let mut projections: Vec<Projection> = input
            .grouping_keys
            .iter()
            .map(|key| Projection::column(key))
            .collect();
        projections.push(Projection::new(
            self.template.instantiate(input.output_name),
            input.output_name,
        ));
        Ok(Box::new(TransformEpisode { projections }))
    }
}

struct TransformEpisode {
    projections: Vec<Projection>,
}

impl TransformEpisode {
    fn transform(
        &self,
        data: &RowBatch,
        executor: &dyn PlanExecutor,
    ) -> Result<RowBatch, VerifierError> {
        let plan = PlanNode::values(vec![data.clone()]).project(self.projections.clone());
        Ok(executor.execute(&plan)?)
    }
}

impl CompareEpisode for TransformEpisode {
    fn compare(
        &self,
        result: &RowBatch,
        alt_result: &RowBatch,
        executor: &dyn PlanExecutor,
    ) -> Result<bool, VerifierError> {
        let expected = self.transform(result, executor)?;
        let actual = self.transform(alt_result, executor)?;
        Ok(expected.same_rows_unordered(&actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::AggregateCall;
    use std::cell::RefCell;

    #[test]
    fn test_projection_list() {
        let verifier = CanonicalizingTransformVerifier::from_expr(Expr::call(
            "array_sort",
            vec![Expr::Placeholder],
        ))
        .unwrap();

        let seen = RefCell::new(Vec::new());
        let executor = |plan: &PlanNode| {
            seen.borrow_mut().push(plan.clone());
            RowBatch::from_columns(vec![]).map_err(anyhow::Error::from)
        };

        let keys = vec!["k0".to_string(), "k1".to_string()];
        let call = AggregateCall::new("array_agg", vec![Expr::column("c0")]);
        let input = VerificationInput {
            batches: &[],
            grouping_keys: &keys,
            aggregate: &call,
            output_name: "a0",
        };
        let episode = verifier.initialize(&input, &executor).unwrap();
        let empty = RowBatch::from_columns(vec![]).unwrap();
        assert!(episode.compare(&empty, &empty, &executor).unwrap());

        let plans = seen.borrow();
        assert_eq!(plans.len(), 2);
        let PlanNode::Project { projections, .. } = &plans[0] else {
            panic!("expected a projection");
        };
        let rendered: Vec<String> = projections.iter().map(|p| p.expr.to_string()).collect();
        assert_eq!(rendered, vec!["k0", "k1", "array_sort(a0)"]);
        assert_eq!(projections[2].alias, "a0");
    }
}
