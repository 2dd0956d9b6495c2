//! Function name to generator/verifier wiring.

use crate::error::VerifierError;
use crate::expr::Expr;
use crate::generator::{
    ErrorBoundGenerator, InputGenerator, Iteration, PercentileGenerator, TopNFunction,
    TopNParameterGenerator,
};
use crate::verifier::{ApproxCardinalityVerifier, CanonicalizingTransformVerifier, ResultVerifier};
use std::collections::HashMap;

/// Internal function that sorts arrays and map keys into a canonical order.
pub const CANONICALIZE: &str = "$internal$canonicalize";

/// How results of a function are to be checked.
#[derive(Debug, Clone, Copy)]
pub enum Verification<'a> {
    /// Plain equality against the reference result.
    Exact,
    /// A custom verifier.
    Custom(&'a ResultVerifier),
    /// Results cannot be checked; only make sure the query runs.
    Skip,
}

/// Generators and verifiers keyed by aggregate function name.
///
/// Generators carry per-iteration state, so a registry must not be shared
/// by concurrently running iterations; build one per worker instead.
/// Verifiers hold no episode state and are cheap to clone.
#[derive(Default)]
pub struct VerificationRegistry {
    generators: HashMap<String, Box<dyn InputGenerator>>,
    verifiers: HashMap<String, Option<ResultVerifier>>,
}

impl VerificationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in generators and verifiers.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        for function in [
            TopNFunction::Min,
            TopNFunction::Max,
            TopNFunction::MinBy,
            TopNFunction::MaxBy,
        ] {
            registry.register_generator(function.name(), TopNParameterGenerator::new(function));
        }
        for name in ["approx_distinct", "approx_set"] {
            registry.register_generator(name, ErrorBoundGenerator::new(name));
        }
        registry.register_generator("approx_percentile", PercentileGenerator::new());

        registry.register_verifier("approx_distinct", ResultVerifier::verify(ApproxCardinalityVerifier));

        let array = ResultVerifier::compare(canonicalize(Expr::Placeholder));
        for name in ["array_agg", "set_agg", "set_union"] {
            registry.register_verifier(name, array.clone());
        }

        let map = ResultVerifier::compare(canonicalize(Expr::call(
            "map_keys",
            vec![Expr::Placeholder],
        )));
        for name in ["map_agg", "map_union", "map_union_sum"] {
            registry.register_verifier(name, map.clone());
        }

        registry.register_verifier(
            "multimap_agg",
            ResultVerifier::compare(transform_verifier(Expr::call(
                "transform_values",
                vec![
                    Expr::Placeholder,
                    Expr::lambda(
                        &["k", "v"],
                        Expr::call(CANONICALIZE, vec![Expr::column("v")]),
                    ),
                ],
            ))),
        );

        for name in [
            // Order-dependent or approximate without a usable check.
            "approx_set",
            "approx_percentile",
            "arbitrary",
            "max_by",
            "min_by",
            // Semantically inconsistent across engines.
            "skewness",
            "kurtosis",
            "entropy",
            "max_data_size_for_stats",
            "sum_data_size_for_stats",
        ] {
            registry.skip_verification(name);
        }

        registry
    }

    pub fn register_generator(
        &mut self,
        function: impl Into<String>,
        generator: impl InputGenerator + 'static,
    ) -> &mut Self {
        self.generators.insert(function.into(), Box::new(generator));
        self
    }

    pub fn register_verifier(
        &mut self,
        function: impl Into<String>,
        verifier: ResultVerifier,
    ) -> &mut Self {
        self.verifiers.insert(function.into(), Some(verifier));
        self
    }

    /// Run `function` without checking its results.
    pub fn skip_verification(&mut self, function: impl Into<String>) -> &mut Self {
        self.verifiers.insert(function.into(), None);
        self
    }

    pub fn has_generator(&self, function: &str) -> bool {
        self.generators.contains_key(function)
    }

    /// Direct access to the generator for `function`.
    ///
    /// Fixed parameters are not reset on this path; the caller must call
    /// [`reset_generators`](Self::reset_generators) at iteration boundaries.
    /// Prefer [`iteration`](Self::iteration), which resets on open and drop.
    pub fn generator_mut(&mut self, function: &str) -> Option<&mut (dyn InputGenerator + 'static)> {
        self.generators.get_mut(function).map(|g| g.as_mut())
    }

    /// Open a fuzzing iteration over the generator for `function`.
    pub fn iteration(&mut self, function: &str) -> Option<Iteration<'_>> {
        self.generators
            .get_mut(function)
            .map(|g| Iteration::new(g.as_mut()))
    }

    /// Reset every generator. Needed only by drivers using
    /// [`generator_mut`](Self::generator_mut).
    pub fn reset_generators(&mut self) {
        for generator in self.generators.values_mut() {
            generator.reset();
        }
    }

    pub fn verification(&self, function: &str) -> Verification<'_> {
        match self.verifiers.get(function) {
            None => Verification::Exact,
            Some(None) => Verification::Skip,
            Some(Some(verifier)) => Verification::Custom(verifier),
        }
    }
}

fn transform_verifier(expr: Expr) -> CanonicalizingTransformVerifier {
    // Built-in templates are fixed at compile time and each has one placeholder.
    match CanonicalizingTransformVerifier::from_expr(expr) {
        Ok(verifier) => verifier,
        Err(err) => unreachable!("built-in transform template: {}", err),
    }
}

fn canonicalize(inner: Expr) -> CanonicalizingTransformVerifier {
    transform_verifier(Expr::call(CANONICALIZE, vec![inner]))
}

/// Build a transform verifier from a user-supplied template expression.
pub fn transform(expr: Expr) -> Result<ResultVerifier, VerifierError> {
    CanonicalizingTransformVerifier::from_expr(expr).map(ResultVerifier::compare)
}
