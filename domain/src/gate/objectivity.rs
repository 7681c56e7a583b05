//! Objectivity Validation gate

use super::citation::normalize_citation;
use super::verdict::{GateKind, ValidationVerdict};
use crate::report::AgentReport;
use std::collections::HashSet;
use std::sync::Arc;

/// Balance-scoring function: `(judicial, advocate, adversary) -> score`.
///
/// Higher is more balanced. The gate only compares the score against its
/// threshold; how the score is computed is up to the implementation.
pub trait BalanceScorer: Send + Sync {
    fn score(&self, judicial: &AgentReport, advocate: &AgentReport, adversary: &AgentReport)
    -> f64;
}

impl<F> BalanceScorer for F
where
    F: Fn(&AgentReport, &AgentReport, &AgentReport) -> f64 + Send + Sync,
{
    fn score(
        &self,
        judicial: &AgentReport,
        advocate: &AgentReport,
        adversary: &AgentReport,
    ) -> f64 {
        self(judicial, advocate, adversary)
    }
}

/// Default scorer: how evenly the judicial report draws on both sides' citations.
///
/// With `a` shared citations on the advocate side and `b` on the adversary
/// side the score is `2·min(a, b) / (a + b)`: 1.0 when both sides are cited
/// equally often, 0.0 when only one side is cited.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationBalanceScorer;

impl BalanceScorer for CitationBalanceScorer {
    fn score(
        &self,
        judicial: &AgentReport,
        advocate: &AgentReport,
        adversary: &AgentReport,
    ) -> f64 {
        let cited = citation_set(judicial);
        let a = citation_set(advocate).intersection(&cited).count();
        let b = citation_set(adversary).intersection(&cited).count();

        if a + b == 0 {
            return 0.0;
        }
        2.0 * a.min(b) as f64 / (a + b) as f64
    }
}

fn citation_set(report: &AgentReport) -> HashSet<String> {
    report
        .citations()
        .iter()
        .map(|c| normalize_citation(c))
        .collect()
}

/// Checks that the Judicial report weighs both sides.
///
/// The report must cite material from both research reports, and the
/// configured scorer must rate it at or above the threshold.
#[derive(Clone)]
pub struct ObjectivityValidation {
    scorer: Arc<dyn BalanceScorer>,
    threshold: f64,
}

impl ObjectivityValidation {
    pub fn new(scorer: Arc<dyn BalanceScorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn verify(
        &self,
        judicial: &AgentReport,
        advocate: &AgentReport,
        adversary: &AgentReport,
    ) -> ValidationVerdict {
        let mut diagnostics = Vec::new();
        let cited = citation_set(judicial);

        for side in [advocate, adversary] {
            if citation_set(side).is_disjoint(&cited) {
                diagnostics.push(format!(
                    "judicial report does not reference any {} citation",
                    side.role()
                ));
            }
        }

        let score = self.scorer.score(judicial, advocate, adversary);
        if score.is_nan() || score < self.threshold {
            diagnostics.push(format!(
                "balance score {:.2} is below threshold {:.2}",
                score, self.threshold
            ));
        }

        ValidationVerdict::from_diagnostics(GateKind::Objectivity, diagnostics)
            .with_subject(judicial.role())
            .with_score(score)
    }
}

impl std::fmt::Debug for ObjectivityValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectivityValidation")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
