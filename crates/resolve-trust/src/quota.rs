//! Dispute quota guard and filing-fee policy
//!
//! The monthly counter resets lazily: the check itself performs the reset
//! when the stored reset month no longer matches the calendar month. No
//! scheduler is involved.

use chrono::{Datelike, Utc};
use resolve_types::{AgentId, OperatorId, ResolveError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::{SharedAgents, TrustLedger};

/// Quota configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Hard cap on dispute filings per calendar month
    pub monthly_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { monthly_limit: 5 }
    }
}

/// Result of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Whether the agent may file another dispute this month
    pub can_file: bool,
    /// Filings counted against the current month (post-reset)
    pub disputes_this_month: u32,
    /// The configured monthly cap
    pub limit: u32,
}

/// Enforces the per-agent monthly dispute cap
#[derive(Clone)]
pub struct DisputeQuotaGuard {
    state: SharedAgents,
    config: QuotaConfig,
}

impl DisputeQuotaGuard {
    /// Build a guard over the same agent store as a ledger
    pub fn new(ledger: &TrustLedger, config: QuotaConfig) -> Self {
        Self {
            state: ledger.state(),
            config,
        }
    }

    /// Check whether an agent may file a dispute
    ///
    /// Performs the lazy calendar-month reset as a side effect before
    /// answering, so the returned count is always for the current month.
    pub async fn check_dispute_limit(&self, agent_id: &AgentId) -> Result<QuotaStatus> {
        let mut state = self.state.write().await;
        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| ResolveError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;

        let now = Utc::now();
        let stored = agent.monthly_reset_at;
        if stored.month() != now.month() || stored.year() != now.year() {
            debug!(agent_id = %agent_id, "monthly dispute counter reset");
            agent.disputes_this_month = 0;
            agent.monthly_reset_at = now;
        }

        Ok(QuotaStatus {
            can_file: agent.disputes_this_month < self.config.monthly_limit,
            disputes_this_month: agent.disputes_this_month,
            limit: self.config.monthly_limit,
        })
    }
}

/// Filing fee assessed for a dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingFee {
    /// Credits to charge
    pub credits: i64,
    /// Whether the waiver policy applied
    pub was_free: bool,
}

/// Fee policy for dispute filings
///
/// Filing is free below the value threshold or while the agent is under the
/// monthly free allowance; past both, the fee is proportional to the stated
/// value with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingFeePolicy {
    /// Below this stated value, filing is always free
    pub free_value_threshold_cents: i64,
    /// Filings per calendar month that are free regardless of value
    pub free_disputes_per_month: u32,
    /// Fee as basis points of the stated value
    pub fee_basis_points: i64,
    /// Minimum fee once a fee applies
    pub fee_floor_credits: i64,
}

impl Default for FilingFeePolicy {
    fn default() -> Self {
        Self {
            free_value_threshold_cents: 10_000,
            free_disputes_per_month: 3,
            fee_basis_points: 200,
            fee_floor_credits: 100,
        }
    }
}

impl FilingFeePolicy {
    /// Assess the fee for a filing
    pub fn assess(&self, stated_value_cents: i64, disputes_this_month: u32) -> FilingFee {
        if stated_value_cents < self.free_value_threshold_cents
            || disputes_this_month < self.free_disputes_per_month
        {
            return FilingFee {
                credits: 0,
                was_free: true,
            };
        }
        let proportional = stated_value_cents * self.fee_basis_points / 10_000;
        FilingFee {
            credits: proportional.max(self.fee_floor_credits),
            was_free: false,
        }
    }
}

/// External credit ledger collaborator
///
/// Billing lives outside this system; filing fees are consumed through this
/// contract only.
#[async_trait::async_trait]
pub trait CreditLedger: Send + Sync {
    /// Whether the operator can cover the amount
    async fn has_sufficient_balance(&self, operator_id: &OperatorId, amount: i64) -> Result<bool>;

    /// Deduct credits, recording the originating reference
    async fn deduct(
        &self,
        operator_id: &OperatorId,
        amount: i64,
        reference_type: &str,
        reference_id: &str,
    ) -> Result<()>;
}

/// In-memory credit ledger for tests and demos
#[derive(Clone, Default)]
pub struct InMemoryCreditLedger {
    balances: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<OperatorId, i64>>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant credits to an operator
    pub async fn grant(&self, operator_id: OperatorId, amount: i64) {
        *self.balances.write().await.entry(operator_id).or_insert(0) += amount;
    }

    /// Current balance for an operator
    pub async fn balance_of(&self, operator_id: &OperatorId) -> i64 {
        self.balances
            .read()
            .await
            .get(operator_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn has_sufficient_balance(&self, operator_id: &OperatorId, amount: i64) -> Result<bool> {
        Ok(self.balance_of(operator_id).await >= amount)
    }

    async fn deduct(
        &self,
        operator_id: &OperatorId,
        amount: i64,
        _reference_type: &str,
        _reference_id: &str,
    ) -> Result<()> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(operator_id.clone()).or_insert(0);
        if *balance < amount {
            return Err(ResolveError::InsufficientCredits {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }
}
