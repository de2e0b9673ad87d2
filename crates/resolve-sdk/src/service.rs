//! The Resolve service facade
//!
//! Wires every component together and exposes one method per operation. The
//! transport layer (HTTP, MCP, whatever carries calls) maps onto these
//! methods 1:1; each returns the discriminated `Outcome` envelope.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use resolve_arbitration::{ArbitrationEngine, RulingProvider};
use resolve_audit::{AuditAction, AuditLog, InMemoryAuditLog};
use resolve_dispute::{
    DisputeConfig, DisputeLifecycle, DisputeServices, EvidenceContent, FileDisputeRequest,
    PlainTextExtractor, TextExtractor,
};
use resolve_escrow::{
    EscrowCoordinator, InMemoryTransfers, ReleaseAuthorization, TransferCapability,
};
use resolve_feedback::{EscalationDesk, FeedbackDesk, MetricsAggregator, MetricsStore};
use resolve_trust::{
    CreditLedger, DisputeQuotaGuard, FilingFeePolicy, InMemoryCreditLedger, QuotaConfig,
    TrustLedger, TrustPolicy, TrustScoreChange,
};
use resolve_types::{
    AgentId, AgentStatus, DecisionEngineMetrics, DecisionFeedback, DisputeId, DisputeStatus,
    Escalation, EscrowAccount, Evidence, EvidenceKind, FeedbackRatings, OperatorId,
    ResolveAgent, ResolveDispute, ResolveError, Result, Ruling, TransactionId,
    TrustHistoryEntry,
};

use crate::envelope::Outcome;

/// Construction options for a service instance
///
/// External collaborators default to the in-memory implementations; real
/// deployments inject their own.
pub struct ServiceOptions {
    pub trust_policy: TrustPolicy,
    pub quota: QuotaConfig,
    pub fees: FilingFeePolicy,
    pub dispute: DisputeConfig,
    pub provider: Arc<dyn RulingProvider>,
    pub credits: Arc<dyn CreditLedger>,
    pub extractor: Arc<dyn TextExtractor>,
    pub transfers: Arc<dyn TransferCapability>,
}

impl ServiceOptions {
    /// Defaults plus in-memory collaborators, around the given provider
    pub fn in_memory(provider: Arc<dyn RulingProvider>) -> Self {
        Self {
            trust_policy: TrustPolicy::default(),
            quota: QuotaConfig::default(),
            fees: FilingFeePolicy::default(),
            dispute: DisputeConfig::default(),
            provider,
            credits: Arc::new(InMemoryCreditLedger::new()),
            extractor: Arc::new(PlainTextExtractor),
            transfers: Arc::new(InMemoryTransfers::new()),
        }
    }
}

/// An agent's trust profile with its mutation history
#[derive(Debug, Clone, Serialize)]
pub struct AgentTrust {
    pub agent: ResolveAgent,
    pub history: Vec<TrustHistoryEntry>,
}

/// The Resolve service
#[derive(Clone)]
pub struct ResolveService {
    ledger: TrustLedger,
    lifecycle: DisputeLifecycle,
    escalations: EscalationDesk,
    feedback: FeedbackDesk,
    aggregator: MetricsAggregator,
    escrow: EscrowCoordinator,
    audit: Arc<dyn AuditLog>,
}

impl ResolveService {
    pub fn new(options: ServiceOptions) -> Self {
        let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());
        let ledger = TrustLedger::with_policy(options.trust_policy);
        let guard = DisputeQuotaGuard::new(&ledger, options.quota);
        let metrics = MetricsStore::new();
        let engine = ArbitrationEngine::new(options.provider);

        let lifecycle = DisputeLifecycle::new(
            DisputeServices {
                ledger: ledger.clone(),
                guard,
                fees: options.fees,
                credits: options.credits,
                extractor: options.extractor,
                engine,
                calibration: Arc::new(metrics.clone()),
                audit: audit.clone(),
            },
            options.dispute,
        );

        let escalations = EscalationDesk::new(lifecycle.clone(), audit.clone());
        let feedback = FeedbackDesk::new(lifecycle.clone());
        let aggregator = MetricsAggregator::new(
            lifecycle.clone(),
            escalations.clone(),
            feedback.clone(),
            metrics,
        );
        let escrow = EscrowCoordinator::new(options.transfers, audit.clone());

        Self {
            ledger,
            lifecycle,
            escalations,
            feedback,
            aggregator,
            escrow,
            audit,
        }
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Register an agent under an operator
    pub async fn register_agent(
        &self,
        operator_id: OperatorId,
        external_ref: &str,
    ) -> Outcome<ResolveAgent> {
        let result = async {
            let agent = self.ledger.register_agent(operator_id, external_ref).await?;
            self.audit
                .record(
                    Some(agent.id.clone()),
                    AuditAction::AgentRegistered {
                        agent_id: agent.id.clone(),
                    },
                )
                .await?;
            Ok(agent)
        }
        .await;
        Outcome::from_result(result)
    }

    /// An agent's trust score, counters, and history
    pub async fn get_agent_trust(&self, agent_id: &AgentId) -> Outcome<AgentTrust> {
        let result = async {
            let agent = self.ledger.get_agent(agent_id).await?;
            let history = self.ledger.history_for(agent_id).await?;
            Ok(AgentTrust { agent, history })
        }
        .await;
        Outcome::from_result(result)
    }

    /// Suspend or reinstate an agent
    pub async fn set_agent_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Outcome<ResolveAgent> {
        let result = async {
            self.ledger.set_status(agent_id, status).await?;
            self.audit
                .record(
                    Some(agent_id.clone()),
                    AuditAction::AgentStatusChanged {
                        agent_id: agent_id.clone(),
                        status: format!("{:?}", status),
                    },
                )
                .await?;
            self.ledger.get_agent(agent_id).await
        }
        .await;
        Outcome::from_result(result)
    }

    /// Record an undisputed transaction completion (grants the trust credit)
    pub async fn record_transaction(
        &self,
        agent_id: &AgentId,
        transaction_id: &TransactionId,
    ) -> Outcome<TrustScoreChange> {
        Outcome::from_result(
            self.ledger
                .record_transaction_completed(agent_id, &transaction_id.to_string())
                .await,
        )
    }

    // ========================================================================
    // Disputes
    // ========================================================================

    /// File a dispute
    pub async fn file_dispute(&self, request: FileDisputeRequest) -> Outcome<ResolveDispute> {
        Outcome::from_result(self.lifecycle.file_dispute(request).await)
    }

    /// Respondent acknowledges a dispute
    pub async fn respond_to_dispute(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Outcome<ResolveDispute> {
        Outcome::from_result(self.lifecycle.respond(dispute_id, agent_id).await)
    }

    /// Submit evidence
    pub async fn submit_evidence(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        kind: EvidenceKind,
        title: &str,
        content: EvidenceContent,
    ) -> Outcome<Evidence> {
        Outcome::from_result(
            self.lifecycle
                .submit_evidence(dispute_id, agent_id, kind, title, content)
                .await,
        )
    }

    /// Mark evidence submission complete; the second completion triggers
    /// arbitration
    pub async fn complete_evidence(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Outcome<ResolveDispute> {
        let result = async {
            let dispute = self
                .lifecycle
                .complete_evidence(dispute_id, agent_id)
                .await?;
            if dispute.evidence_marked_complete() {
                let ruled = self.lifecycle.arbitrate(dispute_id).await?;
                return self.after_ruling(ruled).await;
            }
            Ok(dispute)
        }
        .await;
        Outcome::from_result(result)
    }

    /// Evidence on a dispute, visible to its parties
    pub async fn get_evidence(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Outcome<Vec<Evidence>> {
        Outcome::from_result(self.lifecycle.get_evidence(dispute_id, agent_id).await)
    }

    /// Current decision state; drives arbitration when the evidence window
    /// has elapsed
    pub async fn get_decision(&self, dispute_id: &DisputeId) -> Outcome<ResolveDispute> {
        let result = async {
            let dispute = self.lifecycle.get_decision(dispute_id).await?;
            self.after_ruling(dispute).await
        }
        .await;
        Outcome::from_result(result)
    }

    /// Accept the ruling
    pub async fn accept_decision(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
    ) -> Outcome<ResolveDispute> {
        Outcome::from_result(self.lifecycle.accept_decision(dispute_id, agent_id).await)
    }

    /// Reject the ruling
    pub async fn reject_decision(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        reason: Option<String>,
    ) -> Outcome<ResolveDispute> {
        Outcome::from_result(
            self.lifecycle
                .reject_decision(dispute_id, agent_id, reason)
                .await,
        )
    }

    // ========================================================================
    // Escalation & feedback
    // ========================================================================

    /// Request human escalation of a ruled dispute
    pub async fn request_escalation(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        reason: &str,
    ) -> Outcome<Escalation> {
        Outcome::from_result(
            self.escalations
                .request_escalation(dispute_id, Some(agent_id), reason)
                .await,
        )
    }

    /// Escalation state for a dispute
    pub async fn get_escalation_status(&self, dispute_id: &DisputeId) -> Outcome<Escalation> {
        Outcome::from_result(self.escalations.get_escalation(dispute_id).await)
    }

    /// Record the human arbitrator's binding ruling
    pub async fn resolve_escalation(
        &self,
        dispute_id: &DisputeId,
        ruling: Ruling,
        reasoning: &str,
    ) -> Outcome<Escalation> {
        Outcome::from_result(
            self.escalations
                .resolve_escalation(dispute_id, ruling, reasoning)
                .await,
        )
    }

    /// Submit post-resolution feedback
    pub async fn submit_feedback(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        ratings: FeedbackRatings,
        comment: Option<String>,
    ) -> Outcome<DecisionFeedback> {
        Outcome::from_result(
            self.feedback
                .submit_feedback(dispute_id, agent_id, ratings, comment)
                .await,
        )
    }

    /// Aggregate decision metrics for a period (batch entry point)
    pub async fn aggregate_metrics(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Outcome<Option<DecisionEngineMetrics>> {
        Outcome::from_result(self.aggregator.aggregate_metrics(period_start, period_end).await)
    }

    // ========================================================================
    // Escrow
    // ========================================================================

    /// Hold funds for a transaction
    pub async fn fund_escrow(
        &self,
        transaction_id: TransactionId,
        payer_id: AgentId,
        payee_id: AgentId,
        amount_cents: i64,
    ) -> Outcome<EscrowAccount> {
        Outcome::from_result(
            self.escrow
                .fund_escrow(transaction_id, payer_id, payee_id, amount_cents)
                .await,
        )
    }

    /// Release held funds under the final ruling (or undisputed)
    pub async fn release_escrow(&self, transaction_id: &TransactionId) -> Outcome<EscrowAccount> {
        let result = async {
            let authorization = self.release_authorization(transaction_id).await?;
            self.escrow
                .release_escrow(transaction_id, authorization)
                .await
        }
        .await;
        Outcome::from_result(result)
    }

    /// Escrow state for a transaction
    pub async fn get_escrow_status(&self, transaction_id: &TransactionId) -> Outcome<EscrowAccount> {
        Outcome::from_result(self.escrow.get_escrow_status(transaction_id).await)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Auto-escalate a fresh low-confidence ruling
    async fn after_ruling(&self, dispute: ResolveDispute) -> Result<ResolveDispute> {
        if dispute.status != DisputeStatus::Ruled {
            return Ok(dispute);
        }
        let threshold = self.lifecycle.config().auto_escalate_below_confidence;
        let confidence = match &dispute.ruling_details {
            Some(details) => details.confidence,
            None => return Ok(dispute),
        };
        if confidence >= threshold || self.escalations.is_escalated(&dispute.id).await {
            return Ok(dispute);
        }

        info!(
            dispute = %dispute.id,
            confidence,
            "auto-escalating low-confidence ruling"
        );
        self.escalations
            .request_escalation(
                &dispute.id,
                None,
                format!(
                    "ruling confidence {:.2} below the {:.2} review threshold",
                    confidence, threshold
                ),
            )
            .await?;
        self.lifecycle.get_dispute(&dispute.id).await
    }

    /// Derive what authorizes releasing a transaction's escrow
    async fn release_authorization(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ReleaseAuthorization> {
        let dispute = match self.lifecycle.dispute_for_transaction(transaction_id).await {
            None => return Ok(ReleaseAuthorization::Undisputed),
            Some(dispute) => self.lifecycle.get_dispute(&dispute.id).await?,
        };

        match dispute.status {
            // An expired claim never progressed; the transaction stands
            DisputeStatus::Expired => Ok(ReleaseAuthorization::Undisputed),
            DisputeStatus::Closed | DisputeStatus::Dismissed => {
                let ruling = dispute.ruling.ok_or_else(|| ResolveError::DataIntegrity {
                    message: format!("terminal dispute {} has no ruling", dispute.id),
                })?;
                Ok(ReleaseAuthorization::Ruled {
                    ruling,
                    claimant_id: dispute.claimant_id.clone(),
                })
            }
            _ => Err(ResolveError::ReleaseNotAuthorized {
                transaction_id: transaction_id.to_string(),
                reason: format!(
                    "dispute {} is still open ({})",
                    dispute.id, dispute.status
                ),
            }),
        }
    }
}
