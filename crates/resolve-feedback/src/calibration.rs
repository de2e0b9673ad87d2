//! Calibration context generation
//!
//! Turns the most recent metrics row into heuristic prompt lines that nudge
//! future rulings away from observed biases. An empty result means "no
//! calibration available" and is never an error.

use async_trait::async_trait;

use resolve_arbitration::CalibrationSource;
use resolve_types::DecisionEngineMetrics;

use crate::metrics::MetricsStore;

/// Disagreed-confidence average above this flags overconfidence
const OVERCONFIDENCE_THRESHOLD: f64 = 0.7;
/// Claim types escalating more often than this are flagged
const HOT_ESCALATION_RATE: f64 = 0.3;
/// Minimum decisions before a claim type's escalation rate is trusted
const MIN_TYPE_SAMPLES: u64 = 5;
/// Average ratings below this are flagged
const LOW_RATING: f64 = 3.0;
/// Rejection reasons surfaced per row
const SURFACED_REASONS: usize = 3;

/// Derive calibration lines from a metrics row
pub fn calibration_lines(metrics: &DecisionEngineMetrics) -> Vec<String> {
    let mut lines = Vec::new();

    let disagreed = &metrics.confidence_when_disagreed;
    if disagreed.count > 0 && disagreed.average > OVERCONFIDENCE_THRESHOLD {
        lines.push(format!(
            "Past decisions overturned by human arbitrators carried high confidence \
             (avg {:.2}). State confidence more conservatively when evidence is thin.",
            disagreed.average
        ));
    }

    for breakdown in &metrics.by_claim_type {
        if breakdown.decisions >= MIN_TYPE_SAMPLES
            && breakdown.escalation_rate > HOT_ESCALATION_RATE
        {
            lines.push(format!(
                "{} disputes have escalated at {:.0}% recently. Weigh both sides' \
                 evidence especially carefully for this claim type.",
                breakdown.claim_type,
                breakdown.escalation_rate * 100.0
            ));
        }
    }

    if !metrics.top_rejection_reasons.is_empty() {
        let reasons: Vec<String> = metrics
            .top_rejection_reasons
            .iter()
            .take(SURFACED_REASONS)
            .map(|r| format!("\"{}\" ({}x)", r.reason, r.count))
            .collect();
        lines.push(format!(
            "Parties most often reject decisions citing: {}.",
            reasons.join(", ")
        ));
    }

    let ratings = &metrics.average_ratings;
    if ratings.count > 0 {
        if ratings.fairness < LOW_RATING {
            lines.push(format!(
                "Fairness ratings are low ({:.1}/5). Address both parties' strongest points explicitly.",
                ratings.fairness
            ));
        }
        if ratings.reasoning < LOW_RATING {
            lines.push(format!(
                "Reasoning ratings are low ({:.1}/5). Walk through the decisive evidence step by step.",
                ratings.reasoning
            ));
        }
        if ratings.evidence_handling < LOW_RATING {
            lines.push(format!(
                "Evidence-handling ratings are low ({:.1}/5). Reference each submitted item in the reasoning.",
                ratings.evidence_handling
            ));
        }
    }

    lines
}

#[async_trait]
impl CalibrationSource for MetricsStore {
    /// Heuristic prompt text from the latest metrics row
    ///
    /// Empty when no row exists or no heuristic fires.
    async fn calibration_context(&self) -> String {
        match self.latest().await {
            Some(metrics) => calibration_lines(&metrics).join("\n"),
            None => String::new(),
        }
    }
}
