//! Prompt assembly for the ruling capability
//!
//! The system prompt fixes the output contract; the dispute prompt carries
//! the claim, the party-tagged evidence in submission order, and any
//! calibration notes derived from historical metrics.

use crate::types::ArbitrationContext;
use resolve_types::PartyRole;

/// Build the system prompt, appending calibration notes when present
pub fn system_prompt(context: &ArbitrationContext) -> String {
    let mut prompt = String::from(
        "You are a neutral arbitrator for commercial disputes between autonomous \
         software agents. Weigh the claim and the evidence from both sides and \
         decide the dispute.\n\n\
         Respond with valid JSON only, no other text, in this exact shape:\n\
         {\"ruling\": \"CLAIMANT|RESPONDENT|SPLIT|DISMISSED\", \
         \"confidence\": 0.0-1.0, \
         \"key_factors\": [\"...\"], \
         \"reasoning\": \"...\"}\n\n\
         Rule CLAIMANT when the claim is supported, RESPONDENT when it is not, \
         SPLIT when fault is shared, DISMISSED when the claim is frivolous or \
         unsupportable on its face.",
    );

    if !context.calibration_notes.is_empty() {
        prompt.push_str("\n\nCalibration notes from past decisions:\n");
        prompt.push_str(&context.calibration_notes);
    }

    prompt
}

/// Build the dispute prompt from the claim and ordered evidence
pub fn dispute_prompt(context: &ArbitrationContext) -> String {
    let mut prompt = format!(
        "DISPUTE\n\
         Claim type: {}\n\
         Stated value: {} cents\n\
         Summary: {}\n\
         Details: {}\n\
         Requested resolution: {}\n",
        context.claim_type,
        context.stated_value_cents,
        context.claim_summary,
        context.claim_details,
        context.requested_resolution,
    );

    if context.evidence.is_empty() {
        prompt.push_str("\nNo evidence was submitted by either party.\n");
        return prompt;
    }

    prompt.push_str("\nEVIDENCE (in submission order)\n");
    for (index, item) in context.evidence.iter().enumerate() {
        let side = match item.submitted_as {
            PartyRole::Claimant => "CLAIMANT",
            PartyRole::Respondent => "RESPONDENT",
        };
        prompt.push_str(&format!(
            "[{}] from {} ({:?}): {}\n{}\n\n",
            index + 1,
            side,
            item.kind,
            item.title,
            item.content,
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvidenceItem;
    use chrono::Utc;
    use resolve_types::{ClaimType, EvidenceKind};

    fn context_with_evidence() -> ArbitrationContext {
        ArbitrationContext {
            dispute_ref: "dispute_x".to_string(),
            claim_type: ClaimType::NonPerformance,
            claim_summary: "Scrape job never ran".to_string(),
            claim_details: "Paid for a crawl of 10k pages, zero delivered".to_string(),
            requested_resolution: "Full refund".to_string(),
            stated_value_cents: 4_000,
            evidence: vec![
                EvidenceItem {
                    submitted_as: PartyRole::Claimant,
                    kind: EvidenceKind::PaymentRecord,
                    title: "Payment receipt".to_string(),
                    content: "Paid 40.00 on 2025-06-01".to_string(),
                    submitted_at: Utc::now(),
                },
                EvidenceItem {
                    submitted_as: PartyRole::Respondent,
                    kind: EvidenceKind::WorkProduct,
                    title: "Job logs".to_string(),
                    content: "crawler exited 0".to_string(),
                    submitted_at: Utc::now(),
                },
            ],
            calibration_notes: String::new(),
        }
    }

    #[test]
    fn test_prompt_tags_parties_in_order() {
        let prompt = dispute_prompt(&context_with_evidence());
        let claimant_pos = prompt.find("[1] from CLAIMANT").unwrap();
        let respondent_pos = prompt.find("[2] from RESPONDENT").unwrap();
        assert!(claimant_pos < respondent_pos);
    }

    #[test]
    fn test_system_prompt_includes_calibration() {
        let mut context = context_with_evidence();
        assert!(!system_prompt(&context).contains("Calibration notes"));

        context.calibration_notes = "Confidence has run high on overturned decisions.".to_string();
        let prompt = system_prompt(&context);
        assert!(prompt.contains("Calibration notes"));
        assert!(prompt.contains("run high"));
    }

    #[test]
    fn test_prompt_handles_no_evidence() {
        let mut context = context_with_evidence();
        context.evidence.clear();
        let prompt = dispute_prompt(&context);
        assert!(prompt.contains("No evidence was submitted"));
    }
}
