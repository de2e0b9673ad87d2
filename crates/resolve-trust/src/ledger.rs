//! Trust ledger
//!
//! Owns the agent records and their append-only trust history. Every
//! multi-step mutation (score write + history append, ruling outcome across
//! both parties) happens under a single store write lock, so readers never
//! observe a score without its history entry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use resolve_types::{
    AgentId, AgentStatus, OperatorId, ResolveAgent, ResolveError, Result, Ruling,
    TrustEntryId, TrustHistoryEntry, TrustReference,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::impact::{clamp_score, impact_for_role, TrustPolicy};
use resolve_types::PartyRole;

/// Result of a single trust-score mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrustScoreChange {
    /// Score before the mutation
    pub previous_score: i32,
    /// Score after clamping
    pub new_score: i32,
}

/// Trust changes applied to both sides of a ruled dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RulingTrustOutcome {
    pub claimant: TrustScoreChange,
    pub respondent: TrustScoreChange,
}

pub(crate) struct AgentState {
    pub(crate) agents: HashMap<AgentId, ResolveAgent>,
    pub(crate) by_ref: HashMap<(OperatorId, String), AgentId>,
    pub(crate) history: Vec<TrustHistoryEntry>,
}

pub(crate) type SharedAgents = Arc<RwLock<AgentState>>;

/// The trust ledger
///
/// Thread-safe and cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct TrustLedger {
    state: SharedAgents,
    policy: TrustPolicy,
}

impl TrustLedger {
    /// Create an empty ledger with the default policy
    pub fn new() -> Self {
        Self::with_policy(TrustPolicy::default())
    }

    /// Create an empty ledger with a custom policy
    pub fn with_policy(policy: TrustPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(AgentState {
                agents: HashMap::new(),
                by_ref: HashMap::new(),
                history: Vec::new(),
            })),
            policy,
        }
    }

    /// The active trust policy
    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    pub(crate) fn state(&self) -> SharedAgents {
        self.state.clone()
    }

    /// Register a new agent under an operator
    ///
    /// The (operator, external_ref) pair must be unique.
    pub async fn register_agent(
        &self,
        operator_id: OperatorId,
        external_ref: impl Into<String>,
    ) -> Result<ResolveAgent> {
        let external_ref = external_ref.into();
        if external_ref.trim().is_empty() {
            return Err(ResolveError::invalid_input(
                "external_ref",
                "must not be empty",
            ));
        }

        let mut state = self.state.write().await;
        let key = (operator_id.clone(), external_ref.clone());
        if state.by_ref.contains_key(&key) {
            return Err(ResolveError::AlreadyRegistered {
                operator_id: operator_id.to_string(),
                external_ref,
            });
        }

        let agent = ResolveAgent::register(operator_id, external_ref);
        state.by_ref.insert(key, agent.id.clone());
        state.agents.insert(agent.id.clone(), agent.clone());
        info!(agent_id = %agent.id, "agent registered");
        Ok(agent)
    }

    /// Fetch an agent by ID
    pub async fn get_agent(&self, agent_id: &AgentId) -> Result<ResolveAgent> {
        let state = self.state.read().await;
        state
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| ResolveError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    /// Change an agent's operational status
    pub async fn set_status(&self, agent_id: &AgentId, status: AgentStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| ResolveError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;
        agent.status = status;
        info!(agent_id = %agent_id, ?status, "agent status changed");
        Ok(())
    }

    /// Apply a signed delta to an agent's trust score
    ///
    /// Runs as one transaction: read, clamp, write, append history. The
    /// history entry is written exactly when the score actually moved.
    pub async fn update_trust_score(
        &self,
        agent_id: &AgentId,
        delta: i32,
        reason: impl Into<String>,
        reference: Option<TrustReference>,
    ) -> Result<TrustScoreChange> {
        let mut state = self.state.write().await;
        Self::apply_delta(&mut state, agent_id, delta, reason.into(), reference)
    }

    /// Record an undisputed transaction completion
    ///
    /// Bumps the transaction counters and grants the completion delta in the
    /// same transaction.
    pub async fn record_transaction_completed(
        &self,
        agent_id: &AgentId,
        transaction_ref: &str,
    ) -> Result<TrustScoreChange> {
        let completion_delta = self.policy.completion_delta;
        let mut state = self.state.write().await;
        {
            let agent = state
                .agents
                .get_mut(agent_id)
                .ok_or_else(|| ResolveError::AgentNotFound {
                    agent_id: agent_id.to_string(),
                })?;
            agent.transactions_total += 1;
            agent.transactions_completed += 1;
        }
        Self::apply_delta(
            &mut state,
            agent_id,
            completion_delta,
            "transaction completed".to_string(),
            Some(TrustReference::new("transaction", transaction_ref)),
        )
    }

    /// Bump filing-time dispute counters for both parties
    ///
    /// The claimant's monthly counter is incremented here, after the quota
    /// guard has passed; the guard itself never mutates counts upward.
    pub async fn record_dispute_filed(
        &self,
        claimant_id: &AgentId,
        respondent_id: &AgentId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.agents.contains_key(claimant_id) {
            return Err(ResolveError::AgentNotFound {
                agent_id: claimant_id.to_string(),
            });
        }
        if !state.agents.contains_key(respondent_id) {
            return Err(ResolveError::AgentNotFound {
                agent_id: respondent_id.to_string(),
            });
        }

        let claimant = state.agents.get_mut(claimant_id).unwrap();
        claimant.disputes_as_claimant += 1;
        claimant.disputes_this_month += 1;
        let respondent = state.agents.get_mut(respondent_id).unwrap();
        respondent.disputes_as_respondent += 1;
        Ok(())
    }

    /// Apply a ruling's trust impact and win/loss counters to both parties
    ///
    /// One transaction covers both agents' scores, both history entries, and
    /// the counters, so a crash can never leave half a ruling applied.
    pub async fn apply_dispute_ruling(
        &self,
        dispute_ref: &str,
        claimant_id: &AgentId,
        respondent_id: &AgentId,
        ruling: Ruling,
        stated_value_cents: i64,
    ) -> Result<RulingTrustOutcome> {
        let claimant_delta =
            impact_for_role(&self.policy, ruling, stated_value_cents, PartyRole::Claimant);
        let respondent_delta =
            impact_for_role(&self.policy, ruling, stated_value_cents, PartyRole::Respondent);

        let mut state = self.state.write().await;
        if !state.agents.contains_key(claimant_id) {
            return Err(ResolveError::AgentNotFound {
                agent_id: claimant_id.to_string(),
            });
        }
        if !state.agents.contains_key(respondent_id) {
            return Err(ResolveError::AgentNotFound {
                agent_id: respondent_id.to_string(),
            });
        }

        let reference = TrustReference::new("dispute", dispute_ref);
        let claimant = Self::apply_delta(
            &mut state,
            claimant_id,
            claimant_delta,
            format!("dispute ruled {}", ruling),
            Some(reference.clone()),
        )?;
        let respondent = Self::apply_delta(
            &mut state,
            respondent_id,
            respondent_delta,
            format!("dispute ruled {}", ruling),
            Some(reference),
        )?;

        match ruling {
            Ruling::Claimant => {
                state.agents.get_mut(claimant_id).unwrap().disputes_won += 1;
                state.agents.get_mut(respondent_id).unwrap().disputes_lost += 1;
            }
            Ruling::Respondent => {
                state.agents.get_mut(claimant_id).unwrap().disputes_lost += 1;
                state.agents.get_mut(respondent_id).unwrap().disputes_won += 1;
            }
            Ruling::Dismissed => {
                state.agents.get_mut(claimant_id).unwrap().disputes_lost += 1;
            }
            Ruling::Split => {}
        }

        Ok(RulingTrustOutcome {
            claimant,
            respondent,
        })
    }

    /// Trust history for an agent, newest first
    pub async fn history_for(&self, agent_id: &AgentId) -> Result<Vec<TrustHistoryEntry>> {
        let state = self.state.read().await;
        if !state.agents.contains_key(agent_id) {
            return Err(ResolveError::AgentNotFound {
                agent_id: agent_id.to_string(),
            });
        }
        let mut entries: Vec<TrustHistoryEntry> = state
            .history
            .iter()
            .filter(|e| &e.agent_id == agent_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    fn apply_delta(
        state: &mut AgentState,
        agent_id: &AgentId,
        delta: i32,
        reason: String,
        reference: Option<TrustReference>,
    ) -> Result<TrustScoreChange> {
        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| ResolveError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;

        let previous_score = agent.trust_score;
        let new_score = clamp_score(previous_score + delta);
        if !(resolve_types::TRUST_SCORE_MIN..=resolve_types::TRUST_SCORE_MAX).contains(&new_score)
        {
            return Err(ResolveError::InvariantViolation {
                message: format!("trust score {} escaped [0,100] after clamp", new_score),
            });
        }

        agent.trust_score = new_score;
        let change = TrustScoreChange {
            previous_score,
            new_score,
        };

        if new_score != previous_score {
            state.history.push(TrustHistoryEntry {
                id: TrustEntryId::new(),
                agent_id: agent_id.clone(),
                previous_score,
                new_score,
                delta,
                reason,
                reference,
                created_at: Utc::now(),
            });
            debug!(agent_id = %agent_id, previous_score, new_score, delta, "trust score updated");
        }

        Ok(change)
    }
}

impl Default for TrustLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registered(ledger: &TrustLedger) -> ResolveAgent {
        ledger
            .register_agent(OperatorId::new(), format!("agent-{}", AgentId::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let ledger = TrustLedger::new();
        let agent = ledger
            .register_agent(OperatorId::new(), "crawler-7")
            .await
            .unwrap();
        let fetched = ledger.get_agent(&agent.id).await.unwrap();
        assert_eq!(fetched.trust_score, 50);
        assert_eq!(fetched.external_ref, "crawler-7");
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let ledger = TrustLedger::new();
        let operator = OperatorId::new();
        ledger
            .register_agent(operator.clone(), "crawler-7")
            .await
            .unwrap();
        let err = ledger
            .register_agent(operator, "crawler-7")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AlreadyRegistered { .. }));
    }

    #[tokio::test]
    async fn test_update_writes_history_exactly_when_score_moves() {
        let ledger = TrustLedger::new();
        let agent = registered(&ledger).await;

        let change = ledger
            .update_trust_score(&agent.id, 5, "manual adjustment", None)
            .await
            .unwrap();
        assert_eq!(change.previous_score, 50);
        assert_eq!(change.new_score, 55);
        assert_eq!(ledger.history_for(&agent.id).await.unwrap().len(), 1);

        // Push to the ceiling, then past it: the clamped no-op writes nothing
        ledger
            .update_trust_score(&agent.id, 45, "to ceiling", None)
            .await
            .unwrap();
        let change = ledger
            .update_trust_score(&agent.id, 10, "past ceiling", None)
            .await
            .unwrap();
        assert_eq!(change.new_score, 100);
        assert_eq!(ledger.history_for(&agent.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_score_stays_bounded_under_any_sequence() {
        let ledger = TrustLedger::new();
        let agent = registered(&ledger).await;

        for delta in [-200, 300, -77, 77, -1, 1000, -1000] {
            let change = ledger
                .update_trust_score(&agent.id, delta, "fuzz", None)
                .await
                .unwrap();
            assert!((0..=100).contains(&change.new_score));
        }
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let ledger = TrustLedger::new();
        let agent = registered(&ledger).await;
        ledger
            .update_trust_score(&agent.id, -3, "first", None)
            .await
            .unwrap();
        ledger
            .update_trust_score(&agent.id, 4, "second", None)
            .await
            .unwrap();

        let history = ledger.history_for(&agent.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "second");
        assert_eq!(history[1].reason, "first");
    }

    #[tokio::test]
    async fn test_transaction_completion_grants_credit() {
        let ledger = TrustLedger::new();
        let agent = registered(&ledger).await;
        let change = ledger
            .record_transaction_completed(&agent.id, "tx_1")
            .await
            .unwrap();
        assert_eq!(change.new_score, 51);

        let fetched = ledger.get_agent(&agent.id).await.unwrap();
        assert_eq!(fetched.transactions_total, 1);
        assert_eq!(fetched.transactions_completed, 1);
    }

    #[tokio::test]
    async fn test_ruling_applies_both_sides_atomically() {
        let ledger = TrustLedger::new();
        let claimant = registered(&ledger).await;
        let respondent = registered(&ledger).await;

        let outcome = ledger
            .apply_dispute_ruling("dispute_1", &claimant.id, &respondent.id, Ruling::Claimant, 4_000)
            .await
            .unwrap();
        assert_eq!(outcome.claimant.new_score, 52);
        assert_eq!(outcome.respondent.new_score, 47);

        let claimant = ledger.get_agent(&claimant.id).await.unwrap();
        let respondent = ledger.get_agent(&respondent.id).await.unwrap();
        assert_eq!(claimant.disputes_won, 1);
        assert_eq!(respondent.disputes_lost, 1);
        assert_eq!(ledger.history_for(&claimant.id).await.unwrap().len(), 1);
        assert_eq!(ledger.history_for(&respondent.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dismissal_outcome() {
        let ledger = TrustLedger::new();
        let claimant = registered(&ledger).await;
        let respondent = registered(&ledger).await;

        let outcome = ledger
            .apply_dispute_ruling(
                "dispute_1",
                &claimant.id,
                &respondent.id,
                Ruling::Dismissed,
                50_000,
            )
            .await
            .unwrap();
        assert_eq!(outcome.claimant.new_score, 45);
        assert_eq!(outcome.respondent.new_score, 50);
        // No score change for the respondent means no history entry either
        assert!(ledger.history_for(&respondent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_agent_errors() {
        let ledger = TrustLedger::new();
        let err = ledger
            .update_trust_score(&AgentId::new(), 1, "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AgentNotFound { .. }));
    }
}
