//! Dispute lifecycle state machine
//!
//! Drives a dispute from filing through ruling, acceptance or rejection, and
//! closure. Deadlines are evaluated lazily at the next touch of a dispute.
//! The AI ruling call runs outside every store lock; the ruling, trust
//! impacts, and counters are then persisted in one short write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use resolve_arbitration::{ArbitrationEngine, CalibrationSource};
use resolve_audit::{AuditAction, AuditLog};
use resolve_trust::{CreditLedger, DisputeQuotaGuard, FilingFeePolicy, TrustLedger};
use resolve_types::{
    AgentId, ClaimType, CloseReason, DisputeId, DisputeStatus, Evidence, EvidenceId,
    EvidenceKind, PartyDecision, PartyRole, ResolveDispute, ResolveError, Result, Ruling,
    RulingDetails, TransactionId,
};

use crate::config::DisputeConfig;
use crate::evidence::{EvidenceStore, TextExtractor};

/// A filing request
#[derive(Debug, Clone)]
pub struct FileDisputeRequest {
    pub claimant_id: AgentId,
    pub respondent_id: AgentId,
    pub transaction_id: TransactionId,
    pub claim_type: ClaimType,
    pub claim_summary: String,
    pub claim_details: String,
    pub requested_resolution: String,
    pub stated_value_cents: i64,
}

/// Evidence payload: raw text, or a file that goes through extraction first
#[derive(Debug, Clone)]
pub enum EvidenceContent {
    Text(String),
    File { data: Vec<u8>, filename: String },
}

/// Collaborators the lifecycle drives
pub struct DisputeServices {
    pub ledger: TrustLedger,
    pub guard: DisputeQuotaGuard,
    pub fees: FilingFeePolicy,
    pub credits: Arc<dyn CreditLedger>,
    pub extractor: Arc<dyn TextExtractor>,
    pub engine: ArbitrationEngine,
    pub calibration: Arc<dyn CalibrationSource>,
    pub audit: Arc<dyn AuditLog>,
}

/// The dispute lifecycle manager
///
/// Thread-safe and cheap to clone; clones share the same stores. Operations
/// on the same dispute serialize on the store lock; different disputes only
/// contend for the duration of a map access.
#[derive(Clone)]
pub struct DisputeLifecycle {
    disputes: Arc<RwLock<HashMap<DisputeId, ResolveDispute>>>,
    evidence: EvidenceStore,
    services: Arc<DisputeServices>,
    config: DisputeConfig,
}

impl DisputeLifecycle {
    pub fn new(services: DisputeServices, config: DisputeConfig) -> Self {
        Self {
            disputes: Arc::new(RwLock::new(HashMap::new())),
            evidence: EvidenceStore::new(),
            services: Arc::new(services),
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &DisputeConfig {
        &self.config
    }

    /// File a new dispute
    ///
    /// Validates ownership and quota, assesses the filing fee, charges it
    /// through the credit ledger when due, and creates the dispute in FILED.
    pub async fn file_dispute(&self, request: FileDisputeRequest) -> Result<ResolveDispute> {
        if request.claimant_id == request.respondent_id {
            return Err(ResolveError::invalid_input(
                "respondent_id",
                "an agent cannot file a dispute against itself",
            ));
        }
        if request.claim_summary.trim().chars().count() < self.config.min_summary_chars {
            return Err(ResolveError::invalid_input(
                "claim_summary",
                format!("must be at least {} characters", self.config.min_summary_chars),
            ));
        }
        if request.stated_value_cents <= 0 {
            return Err(ResolveError::invalid_input(
                "stated_value_cents",
                "must be positive",
            ));
        }

        let claimant = self.services.ledger.get_agent(&request.claimant_id).await?;
        if !claimant.is_active() {
            return Err(ResolveError::AgentSuspended {
                agent_id: claimant.id.to_string(),
            });
        }
        // The respondent must exist, but may be suspended: suspension does
        // not shield an agent from claims over past transactions.
        self.services.ledger.get_agent(&request.respondent_id).await?;

        let quota = self
            .services
            .guard
            .check_dispute_limit(&request.claimant_id)
            .await?;
        if !quota.can_file {
            return Err(ResolveError::CannotFileDispute {
                agent_id: request.claimant_id.to_string(),
                disputes_this_month: quota.disputes_this_month,
                limit: quota.limit,
            });
        }

        let fee = self
            .services
            .fees
            .assess(request.stated_value_cents, quota.disputes_this_month);

        let now = Utc::now();
        let dispute = ResolveDispute {
            id: DisputeId::new(),
            transaction_id: request.transaction_id,
            claimant_id: request.claimant_id.clone(),
            respondent_id: request.respondent_id.clone(),
            claim_type: request.claim_type,
            claim_summary: request.claim_summary,
            claim_details: request.claim_details,
            requested_resolution: request.requested_resolution,
            stated_value_cents: request.stated_value_cents,
            status: DisputeStatus::Filed,
            response_deadline: now + Duration::hours(self.config.response_deadline_hours),
            evidence_deadline: None,
            claimant_evidence_complete: false,
            respondent_evidence_complete: false,
            credits_charged: fee.credits,
            was_free: fee.was_free,
            ruling: None,
            ruling_reasoning: None,
            ruling_details: None,
            ruled_at: None,
            claimant_decision: PartyDecision::default(),
            respondent_decision: PartyDecision::default(),
            close_reason: None,
            closed_at: None,
            filed_at: now,
        };

        if fee.credits > 0 {
            self.services
                .credits
                .deduct(
                    &claimant.operator_id,
                    fee.credits,
                    "dispute",
                    &dispute.id.to_string(),
                )
                .await?;
        }

        {
            let mut disputes = self.disputes.write().await;
            self.services
                .ledger
                .record_dispute_filed(&request.claimant_id, &request.respondent_id)
                .await?;
            disputes.insert(dispute.id.clone(), dispute.clone());
        }

        self.services
            .audit
            .record(
                Some(request.claimant_id),
                AuditAction::DisputeFiled {
                    dispute_id: dispute.id.clone(),
                    credits_charged: fee.credits,
                },
            )
            .await?;

        info!(
            dispute = %dispute.id,
            value_cents = dispute.stated_value_cents,
            free = dispute.was_free,
            "dispute filed"
        );
        Ok(dispute)
    }

    /// Respondent acknowledges the dispute, opening evidence submission
    pub async fn respond(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let snapshot = {
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

            if dispute.role_of(agent_id)? != PartyRole::Respondent {
                return Err(ResolveError::invalid_input(
                    "agent_id",
                    "only the respondent may acknowledge a dispute",
                ));
            }
            if dispute.status != DisputeStatus::Filed {
                return Err(Self::state_error(dispute, "acknowledge"));
            }

            dispute.status = DisputeStatus::EvidenceSubmission;
            dispute.evidence_deadline =
                Some(now + Duration::hours(self.config.evidence_window_hours));
            dispute.clone()
        };

        self.services
            .audit
            .record(
                Some(agent_id.clone()),
                AuditAction::DisputeAcknowledged {
                    dispute_id: dispute_id.clone(),
                },
            )
            .await?;

        info!(dispute = %dispute_id, "respondent acknowledged");
        Ok(snapshot)
    }

    /// Submit evidence to a dispute in EVIDENCE_SUBMISSION
    ///
    /// File payloads pass through the extraction collaborator first; an
    /// extraction failure tells the caller to resubmit as text.
    pub async fn submit_evidence(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        kind: EvidenceKind,
        title: impl Into<String>,
        content: EvidenceContent,
    ) -> Result<Evidence> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ResolveError::invalid_input("title", "must not be empty"));
        }

        // Normalize the payload before touching the dispute store; the
        // extraction collaborator may be slow and must not hold locks.
        let (text, source_filename, page_count, truncated) = match content {
            EvidenceContent::Text(text) => {
                let chars = text.chars().count();
                if chars > self.config.max_evidence_chars {
                    return Err(ResolveError::EvidenceTooLarge {
                        size: chars,
                        limit: self.config.max_evidence_chars,
                    });
                }
                (text, None, None, false)
            }
            EvidenceContent::File { data, filename } => {
                let extracted = self
                    .services
                    .extractor
                    .extract_text(&data, &filename)
                    .await?;
                let chars = extracted.text.chars().count();
                let over_cap = chars > self.config.max_evidence_chars;
                let text = if over_cap {
                    extracted
                        .text
                        .chars()
                        .take(self.config.max_evidence_chars)
                        .collect()
                } else {
                    extracted.text
                };
                (
                    text,
                    Some(filename),
                    Some(extracted.page_count),
                    extracted.truncated || over_cap,
                )
            }
        };

        let now = Utc::now();
        let evidence = {
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

            let role = dispute.role_of(agent_id)?;
            if dispute.status != DisputeStatus::EvidenceSubmission {
                return Err(Self::state_error(dispute, "submit evidence to"));
            }
            if dispute.evidence_window_elapsed(now) {
                return Err(Self::state_error(dispute, "submit evidence to"));
            }

            let evidence = Evidence {
                id: EvidenceId::new(),
                dispute_id: dispute_id.clone(),
                submitted_by: agent_id.clone(),
                submitted_as: role,
                kind,
                title,
                content: text,
                source_filename,
                page_count,
                truncated,
                submitted_at: now,
            };
            self.evidence.append(evidence.clone());
            evidence
        };

        self.services
            .audit
            .record(
                Some(agent_id.clone()),
                AuditAction::EvidenceSubmitted {
                    dispute_id: dispute_id.clone(),
                },
            )
            .await?;

        Ok(evidence)
    }

    /// Mark one side's evidence submission complete
    ///
    /// Once both sides have marked complete (or the review window elapses),
    /// the dispute is ready for arbitration.
    pub async fn complete_evidence(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let mut disputes = self.disputes.write().await;
        let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

        let role = dispute.role_of(agent_id)?;
        if dispute.status != DisputeStatus::EvidenceSubmission {
            return Err(Self::state_error(dispute, "complete evidence for"));
        }

        match role {
            PartyRole::Claimant => dispute.claimant_evidence_complete = true,
            PartyRole::Respondent => dispute.respondent_evidence_complete = true,
        }
        Ok(dispute.clone())
    }

    /// Run arbitration over a dispute that is ready for ruling
    ///
    /// The provider call happens with no store lock held; the ruling, the
    /// trust impacts for both parties, and the win/loss counters are then
    /// persisted in one short transaction. On provider failure the dispute
    /// stays in EVIDENCE_SUBMISSION for retry.
    pub async fn arbitrate(&self, dispute_id: &DisputeId) -> Result<ResolveDispute> {
        let now = Utc::now();

        // Short read: snapshot the dispute and check readiness
        let dispute_snapshot = {
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

            if dispute.ruling.is_some() {
                return Ok(dispute.clone());
            }
            if !dispute.ready_for_ruling(now) {
                return Err(Self::state_error(dispute, "arbitrate"));
            }
            dispute.clone()
        };

        let evidence = self.evidence.for_dispute(dispute_id);
        let calibration = self.services.calibration.calibration_context().await;

        // The capability may block for seconds; no lock is held here
        let outcome = self
            .services
            .engine
            .rule(&dispute_snapshot, &evidence, calibration)
            .await?;

        // Short write: persist ruling + trust + counters together
        let snapshot = {
            let mut disputes = self.disputes.write().await;
            let dispute = disputes.get_mut(dispute_id).ok_or_else(|| {
                ResolveError::DisputeNotFound {
                    dispute_id: dispute_id.to_string(),
                }
            })?;

            if dispute.status != DisputeStatus::EvidenceSubmission {
                // A concurrent call ruled first; surface its result
                warn!(dispute = %dispute_id, "arbitration raced, keeping existing outcome");
                return Ok(dispute.clone());
            }

            self.services
                .ledger
                .apply_dispute_ruling(
                    &dispute.id.to_string(),
                    &dispute.claimant_id,
                    &dispute.respondent_id,
                    outcome.ruling,
                    dispute.stated_value_cents,
                )
                .await?;

            dispute.ruling = Some(outcome.ruling);
            dispute.ruling_reasoning = Some(outcome.reasoning.clone());
            dispute.ruling_details = Some(RulingDetails {
                confidence: outcome.confidence,
                key_factors: outcome.key_factors.clone(),
            });
            dispute.ruled_at = Some(Utc::now());
            dispute.status = if outcome.ruling == Ruling::Dismissed {
                DisputeStatus::Dismissed
            } else {
                DisputeStatus::Ruled
            };
            dispute.clone()
        };

        self.services
            .audit
            .record(
                None,
                AuditAction::RulingIssued {
                    dispute_id: dispute_id.clone(),
                    ruling: outcome.ruling,
                },
            )
            .await?;

        Ok(snapshot)
    }

    /// Fetch the current decision state, lazily driving ready disputes
    ///
    /// When the evidence window has elapsed with no ruling yet, this is the
    /// touch that triggers arbitration.
    pub async fn get_decision(&self, dispute_id: &DisputeId) -> Result<ResolveDispute> {
        let ready = {
            let now = Utc::now();
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;
            dispute.ready_for_ruling(now)
        };

        if ready {
            return self.arbitrate(dispute_id).await;
        }
        self.get_dispute(dispute_id).await
    }

    /// A party accepts the ruling
    ///
    /// The dispute closes only when both parties have accepted.
    pub async fn accept_decision(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let snapshot = {
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

            let role = dispute.role_of(agent_id)?;
            if !dispute.status.awaiting_ruling_response() {
                return Err(Self::state_error(dispute, "accept the ruling on"));
            }
            if dispute.decision(role).recorded() {
                return Err(ResolveError::DecisionAlreadyRecorded {
                    dispute_id: dispute_id.to_string(),
                    agent_id: agent_id.to_string(),
                });
            }

            let decision = dispute.decision_mut(role);
            decision.accepted = Some(true);
            decision.responded_at = Some(now);

            if dispute.both_accepted() {
                dispute.status = DisputeStatus::Closed;
                dispute.close_reason = Some(CloseReason::BothAccepted);
                dispute.closed_at = Some(now);
                info!(dispute = %dispute_id, "ruling accepted by both parties, dispute closed");
            } else if dispute.status == DisputeStatus::Ruled {
                dispute.status = DisputeStatus::Accepted;
            }
            dispute.clone()
        };

        self.services
            .audit
            .record(
                Some(agent_id.clone()),
                AuditAction::RulingResponse {
                    dispute_id: dispute_id.clone(),
                    accepted: true,
                },
            )
            .await?;

        Ok(snapshot)
    }

    /// A party rejects the ruling
    ///
    /// A rejection leaves the dispute awaiting escalation; if none arrives
    /// within the finality window, the ruling lazily becomes binding.
    pub async fn reject_decision(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        reason: Option<String>,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let snapshot = {
            let mut disputes = self.disputes.write().await;
            let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

            let role = dispute.role_of(agent_id)?;
            if !dispute.status.awaiting_ruling_response() {
                return Err(Self::state_error(dispute, "reject the ruling on"));
            }
            if dispute.decision(role).recorded() {
                return Err(ResolveError::DecisionAlreadyRecorded {
                    dispute_id: dispute_id.to_string(),
                    agent_id: agent_id.to_string(),
                });
            }

            let decision = dispute.decision_mut(role);
            decision.accepted = Some(false);
            decision.rejection_reason = reason;
            decision.responded_at = Some(now);
            dispute.status = DisputeStatus::Rejected;
            dispute.clone()
        };

        self.services
            .audit
            .record(
                Some(agent_id.clone()),
                AuditAction::RulingResponse {
                    dispute_id: dispute_id.clone(),
                    accepted: false,
                },
            )
            .await?;

        Ok(snapshot)
    }

    /// Move a ruled dispute to ESCALATED
    ///
    /// `requested_by` is absent for the low-confidence auto-trigger. Calling
    /// on an already-escalated dispute is a no-op returning current state.
    pub async fn escalate(
        &self,
        dispute_id: &DisputeId,
        requested_by: Option<&AgentId>,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let mut disputes = self.disputes.write().await;
        let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

        if dispute.status == DisputeStatus::Escalated {
            return Ok(dispute.clone());
        }
        if let Some(agent_id) = requested_by {
            dispute.role_of(agent_id)?;
        }
        if !dispute.status.awaiting_ruling_response() {
            return Err(Self::state_error(dispute, "escalate"));
        }

        dispute.status = DisputeStatus::Escalated;
        info!(dispute = %dispute_id, "dispute escalated to human arbitration");
        Ok(dispute.clone())
    }

    /// Close an escalated dispute with the human arbitrator's binding ruling
    pub async fn close_escalated(
        &self,
        dispute_id: &DisputeId,
        human_ruling: Ruling,
    ) -> Result<ResolveDispute> {
        let now = Utc::now();
        let mut disputes = self.disputes.write().await;
        let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;

        if dispute.status != DisputeStatus::Escalated {
            return Err(Self::state_error(dispute, "resolve the escalation of"));
        }

        dispute.ruling = Some(human_ruling);
        dispute.status = DisputeStatus::Closed;
        dispute.close_reason = Some(CloseReason::EscalationResolved);
        dispute.closed_at = Some(now);
        info!(dispute = %dispute_id, ruling = %human_ruling, "escalation resolved, dispute closed");
        Ok(dispute.clone())
    }

    /// Fetch a dispute, applying lazy deadline transitions
    pub async fn get_dispute(&self, dispute_id: &DisputeId) -> Result<ResolveDispute> {
        let now = Utc::now();
        let mut disputes = self.disputes.write().await;
        let dispute = Self::get_live(&mut disputes, dispute_id, &self.config, now)?;
        Ok(dispute.clone())
    }

    /// Evidence on a dispute, readable by its parties only
    pub async fn get_evidence(
        &self,
        dispute_id: &DisputeId,
        requester: &AgentId,
    ) -> Result<Vec<Evidence>> {
        let dispute = self.get_dispute(dispute_id).await?;
        dispute.role_of(requester)?;
        Ok(self.evidence.for_dispute(dispute_id))
    }

    /// Evidence on a dispute, for internal subsystems
    pub fn evidence_for(&self, dispute_id: &DisputeId) -> Vec<Evidence> {
        self.evidence.for_dispute(dispute_id)
    }

    /// The dispute over a transaction, if one was filed
    pub async fn dispute_for_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Option<ResolveDispute> {
        let disputes = self.disputes.read().await;
        disputes
            .values()
            .find(|d| &d.transaction_id == transaction_id)
            .cloned()
    }

    /// Disputes ruled inside a half-open window, for metrics aggregation
    pub async fn disputes_ruled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<ResolveDispute> {
        let disputes = self.disputes.read().await;
        disputes
            .values()
            .filter(|d| {
                d.ruled_at
                    .map(|ruled| ruled >= start && ruled < end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Look up a dispute and apply lazy deadline transitions in place
    fn get_live<'a>(
        disputes: &'a mut HashMap<DisputeId, ResolveDispute>,
        dispute_id: &DisputeId,
        config: &DisputeConfig,
        now: DateTime<Utc>,
    ) -> Result<&'a mut ResolveDispute> {
        let dispute =
            disputes
                .get_mut(dispute_id)
                .ok_or_else(|| ResolveError::DisputeNotFound {
                    dispute_id: dispute_id.to_string(),
                })?;

        if dispute.response_overdue(now) {
            dispute.status = DisputeStatus::Expired;
            warn!(dispute = %dispute_id, "response deadline elapsed, dispute expired");
        }

        if dispute.status.awaiting_ruling_response() {
            if let Some(ruled_at) = dispute.ruled_at {
                if now > ruled_at + Duration::hours(config.ruling_finality_window_hours) {
                    dispute.status = DisputeStatus::Closed;
                    dispute.close_reason = Some(CloseReason::FinalityElapsed);
                    dispute.closed_at = Some(now);
                    info!(dispute = %dispute_id, "finality window elapsed, ruling is binding");
                }
            }
        }

        Ok(dispute)
    }

    fn state_error(dispute: &ResolveDispute, action: &str) -> ResolveError {
        ResolveError::InvalidDisputeState {
            dispute_id: dispute.id.to_string(),
            status: dispute.status.to_string(),
            action: action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::PlainTextExtractor;
    use resolve_arbitration::{DeterministicRulingProvider, NoCalibration};
    use resolve_audit::InMemoryAuditLog;
    use resolve_trust::{InMemoryCreditLedger, QuotaConfig};
    use resolve_types::OperatorId;

    struct Fixture {
        lifecycle: DisputeLifecycle,
        ledger: TrustLedger,
        credits: InMemoryCreditLedger,
        claimant: resolve_types::ResolveAgent,
        respondent: resolve_types::ResolveAgent,
    }

    async fn fixture() -> Fixture {
        let ledger = TrustLedger::new();
        let guard = DisputeQuotaGuard::new(&ledger, QuotaConfig::default());
        let credits = InMemoryCreditLedger::new();
        let engine = ArbitrationEngine::new(Arc::new(DeterministicRulingProvider::new()));

        let claimant = ledger
            .register_agent(OperatorId::new(), "claimant-bot")
            .await
            .unwrap();
        let respondent = ledger
            .register_agent(OperatorId::new(), "respondent-bot")
            .await
            .unwrap();

        let lifecycle = DisputeLifecycle::new(
            DisputeServices {
                ledger: ledger.clone(),
                guard,
                fees: FilingFeePolicy::default(),
                credits: Arc::new(credits.clone()),
                extractor: Arc::new(PlainTextExtractor),
                engine,
                calibration: Arc::new(NoCalibration),
                audit: Arc::new(InMemoryAuditLog::new()),
            },
            DisputeConfig::default(),
        );

        Fixture {
            lifecycle,
            ledger,
            credits,
            claimant,
            respondent,
        }
    }

    fn filing(fx: &Fixture, value_cents: i64) -> FileDisputeRequest {
        FileDisputeRequest {
            claimant_id: fx.claimant.id.clone(),
            respondent_id: fx.respondent.id.clone(),
            transaction_id: TransactionId::new(),
            claim_type: ClaimType::NonPerformance,
            claim_summary: "Service was never delivered".to_string(),
            claim_details: "Paid for a crawl job; no output ever arrived".to_string(),
            requested_resolution: "Full refund".to_string(),
            stated_value_cents: value_cents,
        }
    }

    async fn to_evidence_stage(fx: &Fixture, value_cents: i64) -> ResolveDispute {
        let dispute = fx.lifecycle.file_dispute(filing(fx, value_cents)).await.unwrap();
        fx.lifecycle
            .respond(&dispute.id, &fx.respondent.id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_small_value_filing_is_free() {
        let fx = fixture().await;
        let dispute = fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap();
        assert_eq!(dispute.status, DisputeStatus::Filed);
        assert!(dispute.was_free);
        assert_eq!(dispute.credits_charged, 0);

        let claimant = fx.ledger.get_agent(&fx.claimant.id).await.unwrap();
        assert_eq!(claimant.disputes_this_month, 1);
        assert_eq!(claimant.disputes_as_claimant, 1);
    }

    #[tokio::test]
    async fn test_filing_blocked_at_quota() {
        let fx = fixture().await;
        for _ in 0..5 {
            fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap();
        }
        let err = fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap_err();
        assert!(matches!(err, ResolveError::CannotFileDispute { .. }));
    }

    #[tokio::test]
    async fn test_fee_charged_past_free_allowance() {
        let fx = fixture().await;
        fx.credits.grant(fx.claimant.operator_id.clone(), 100_000).await;

        // Three free filings regardless of value, then fees apply
        for _ in 0..3 {
            fx.lifecycle.file_dispute(filing(&fx, 500_000)).await.unwrap();
        }
        let dispute = fx.lifecycle.file_dispute(filing(&fx, 500_000)).await.unwrap();
        assert!(!dispute.was_free);
        // $5,000 at 200bp
        assert_eq!(dispute.credits_charged, 10_000);
        assert_eq!(fx.credits.balance_of(&fx.claimant.operator_id).await, 90_000);
    }

    #[tokio::test]
    async fn test_fee_fails_without_credits() {
        let fx = fixture().await;
        for _ in 0..3 {
            fx.lifecycle.file_dispute(filing(&fx, 500_000)).await.unwrap();
        }
        let err = fx.lifecycle.file_dispute(filing(&fx, 500_000)).await.unwrap_err();
        assert!(matches!(err, ResolveError::InsufficientCredits { .. }));
    }

    #[tokio::test]
    async fn test_self_dispute_rejected() {
        let fx = fixture().await;
        let mut request = filing(&fx, 4_000);
        request.respondent_id = request.claimant_id.clone();
        let err = fx.lifecycle.file_dispute(request).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_respond_opens_evidence_window() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        assert_eq!(dispute.status, DisputeStatus::EvidenceSubmission);
        assert!(dispute.evidence_deadline.is_some());
    }

    #[tokio::test]
    async fn test_claimant_cannot_acknowledge() {
        let fx = fixture().await;
        let dispute = fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap();
        let err = fx
            .lifecycle
            .respond(&dispute.id, &fx.claimant.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_evidence_requires_submission_state() {
        let fx = fixture().await;
        let dispute = fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap();

        // Still FILED: no evidence yet
        let err = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Correspondence,
                "chat log",
                EvidenceContent::Text("transcript".to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    #[tokio::test]
    async fn test_non_party_cannot_submit_evidence() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        let outsider = fx
            .ledger
            .register_agent(OperatorId::new(), "outsider")
            .await
            .unwrap();

        let err = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &outsider.id,
                EvidenceKind::Other,
                "opinion",
                EvidenceContent::Text("I saw it all".to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotParty { .. }));
    }

    #[tokio::test]
    async fn test_oversized_text_evidence_rejected() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        let oversized = "x".repeat(50_001);

        let err = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::WorkProduct,
                "dump",
                EvidenceContent::Text(oversized),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EvidenceTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_file_evidence_goes_through_extraction() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;

        let evidence = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Agreement,
                "signed terms",
                EvidenceContent::File {
                    data: b"the agreed terms".to_vec(),
                    filename: "terms.txt".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(evidence.content, "the agreed terms");
        assert_eq!(evidence.source_filename.as_deref(), Some("terms.txt"));

        let err = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Agreement,
                "scan",
                EvidenceContent::File {
                    data: vec![0xff, 0x00, 0x88],
                    filename: "scan.pdf".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ExtractionFailed { .. }));

        // The failed extraction did not disturb the dispute
        let fetched = fx.lifecycle.get_dispute(&dispute.id).await.unwrap();
        assert_eq!(fetched.status, DisputeStatus::EvidenceSubmission);
    }

    #[tokio::test]
    async fn test_full_ruling_applies_trust_and_counters() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;

        // Claimant substantiates more fully; deterministic provider rules CLAIMANT
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::PaymentRecord,
                "receipt",
                EvidenceContent::Text("paid in full".to_string()),
            )
            .await
            .unwrap();
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Correspondence,
                "broken promises",
                EvidenceContent::Text("no delivery after 3 reminders".to_string()),
            )
            .await
            .unwrap();
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.respondent.id,
                EvidenceKind::WorkProduct,
                "partial logs",
                EvidenceContent::Text("job started".to_string()),
            )
            .await
            .unwrap();

        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();

        let ruled = fx.lifecycle.arbitrate(&dispute.id).await.unwrap();
        assert_eq!(ruled.status, DisputeStatus::Ruled);
        assert_eq!(ruled.ruling, Some(Ruling::Claimant));
        assert!(ruled.ruling_details.is_some());

        // Small-value band: winner +2, loser -3
        let claimant = fx.ledger.get_agent(&fx.claimant.id).await.unwrap();
        let respondent = fx.ledger.get_agent(&fx.respondent.id).await.unwrap();
        assert_eq!(claimant.trust_score, 52);
        assert_eq!(respondent.trust_score, 47);
        assert_eq!(claimant.disputes_won, 1);
        assert_eq!(respondent.disputes_lost, 1);
    }

    #[tokio::test]
    async fn test_evidence_rejected_after_ruling() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Other,
                "note",
                EvidenceContent::Text("supporting note".to_string()),
            )
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();
        fx.lifecycle.arbitrate(&dispute.id).await.unwrap();

        let err = fx
            .lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Other,
                "late",
                EvidenceContent::Text("one more thing".to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    #[tokio::test]
    async fn test_arbitrate_requires_readiness() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        let err = fx.lifecycle.arbitrate(&dispute.id).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    #[tokio::test]
    async fn test_elapsed_window_triggers_ruling_on_get_decision() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 4_000).await;
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::Other,
                "note",
                EvidenceContent::Text("claim support".to_string()),
            )
            .await
            .unwrap();

        // Push the evidence deadline into the past
        {
            let mut disputes = fx.lifecycle.disputes.write().await;
            disputes.get_mut(&dispute.id).unwrap().evidence_deadline =
                Some(Utc::now() - Duration::minutes(1));
        }

        let decided = fx.lifecycle.get_decision(&dispute.id).await.unwrap();
        assert_eq!(decided.status, DisputeStatus::Ruled);
        assert_eq!(decided.ruling, Some(Ruling::Claimant));
    }

    #[tokio::test]
    async fn test_single_acceptance_does_not_close() {
        let fx = fixture().await;
        let dispute = ruled_dispute(&fx).await;

        let after = fx
            .lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        assert_eq!(after.status, DisputeStatus::Accepted);
        assert!(after.closed_at.is_none());

        let closed = fx
            .lifecycle
            .accept_decision(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();
        assert_eq!(closed.status, DisputeStatus::Closed);
        assert_eq!(closed.close_reason, Some(CloseReason::BothAccepted));
        assert!(closed.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_party_responds_to_ruling_once() {
        let fx = fixture().await;
        let dispute = ruled_dispute(&fx).await;

        fx.lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        let err = fx
            .lifecycle
            .reject_decision(&dispute.id, &fx.claimant.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::DecisionAlreadyRecorded { .. }));
    }

    #[tokio::test]
    async fn test_rejection_then_escalation() {
        let fx = fixture().await;
        let dispute = ruled_dispute(&fx).await;

        let rejected = fx
            .lifecycle
            .reject_decision(
                &dispute.id,
                &fx.respondent.id,
                Some("evidence was misread".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, DisputeStatus::Rejected);

        let escalated = fx
            .lifecycle
            .escalate(&dispute.id, Some(&fx.respondent.id))
            .await
            .unwrap();
        assert_eq!(escalated.status, DisputeStatus::Escalated);

        // Second escalate call is a no-op
        let again = fx
            .lifecycle
            .escalate(&dispute.id, Some(&fx.claimant.id))
            .await
            .unwrap();
        assert_eq!(again.status, DisputeStatus::Escalated);
    }

    #[tokio::test]
    async fn test_escalation_close_overrides_ruling() {
        let fx = fixture().await;
        let dispute = ruled_dispute(&fx).await;
        fx.lifecycle
            .escalate(&dispute.id, Some(&fx.claimant.id))
            .await
            .unwrap();

        let closed = fx
            .lifecycle
            .close_escalated(&dispute.id, Ruling::Respondent)
            .await
            .unwrap();
        assert_eq!(closed.status, DisputeStatus::Closed);
        assert_eq!(closed.ruling, Some(Ruling::Respondent));
        assert_eq!(closed.close_reason, Some(CloseReason::EscalationResolved));
    }

    #[tokio::test]
    async fn test_response_deadline_expires_lazily() {
        let fx = fixture().await;
        let dispute = fx.lifecycle.file_dispute(filing(&fx, 4_000)).await.unwrap();

        {
            let mut disputes = fx.lifecycle.disputes.write().await;
            disputes.get_mut(&dispute.id).unwrap().response_deadline =
                Utc::now() - Duration::hours(1);
        }

        let fetched = fx.lifecycle.get_dispute(&dispute.id).await.unwrap();
        assert_eq!(fetched.status, DisputeStatus::Expired);

        // Terminal: the respondent can no longer acknowledge
        let err = fx
            .lifecycle
            .respond(&dispute.id, &fx.respondent.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    #[tokio::test]
    async fn test_finality_window_closes_rejected_dispute() {
        let fx = fixture().await;
        let dispute = ruled_dispute(&fx).await;
        fx.lifecycle
            .reject_decision(&dispute.id, &fx.respondent.id, None)
            .await
            .unwrap();

        {
            let mut disputes = fx.lifecycle.disputes.write().await;
            disputes.get_mut(&dispute.id).unwrap().ruled_at =
                Some(Utc::now() - Duration::hours(200));
        }

        let fetched = fx.lifecycle.get_dispute(&dispute.id).await.unwrap();
        assert_eq!(fetched.status, DisputeStatus::Closed);
        assert_eq!(fetched.close_reason, Some(CloseReason::FinalityElapsed));
    }

    #[tokio::test]
    async fn test_dismissed_ruling_is_terminal() {
        let fx = fixture().await;
        let dispute = to_evidence_stage(&fx, 50_000).await;

        // Nobody submits anything: deterministic provider dismisses
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();

        let ruled = fx.lifecycle.arbitrate(&dispute.id).await.unwrap();
        assert_eq!(ruled.status, DisputeStatus::Dismissed);
        assert_eq!(ruled.ruling, Some(Ruling::Dismissed));

        // Frivolous-claim penalty on the claimant only
        let claimant = fx.ledger.get_agent(&fx.claimant.id).await.unwrap();
        let respondent = fx.ledger.get_agent(&fx.respondent.id).await.unwrap();
        assert_eq!(claimant.trust_score, 45);
        assert_eq!(respondent.trust_score, 50);

        let err = fx
            .lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    /// Drive a fixture dispute to RULED (claimant wins, small value)
    async fn ruled_dispute(fx: &Fixture) -> ResolveDispute {
        let dispute = to_evidence_stage(fx, 4_000).await;
        fx.lifecycle
            .submit_evidence(
                &dispute.id,
                &fx.claimant.id,
                EvidenceKind::PaymentRecord,
                "receipt",
                EvidenceContent::Text("paid".to_string()),
            )
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .complete_evidence(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();
        fx.lifecycle.arbitrate(&dispute.id).await.unwrap()
    }
}
