//! Resolve Escrow - Ruling-gated fund holding
//!
//! A thin coordinator around an external transfer capability. Funds are held
//! per transaction while a dispute may be live; release happens exactly once
//! and only to a destination the final ruling authorizes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use resolve_audit::{AuditAction, AuditLog};
use resolve_types::{
    AgentId, EscrowAccount, EscrowId, EscrowState, ResolveError, Result, Ruling,
    SettlementTransfer, TransactionId, TransferId,
};

/// External payout capability
///
/// Transfer mechanics (payment rails, ledgers) live outside this system.
#[async_trait::async_trait]
pub trait TransferCapability: Send + Sync {
    /// Move funds to a destination agent; returns the external transfer ref
    async fn create_transfer(
        &self,
        destination: &AgentId,
        amount_cents: i64,
        metadata: &str,
    ) -> Result<TransferId>;
}

/// In-memory transfer backend for tests and demos
#[derive(Clone, Default)]
pub struct InMemoryTransfers {
    received: Arc<RwLock<HashMap<AgentId, i64>>>,
}

impl InMemoryTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount transferred to an agent so far
    pub async fn received_by(&self, agent_id: &AgentId) -> i64 {
        self.received
            .read()
            .await
            .get(agent_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl TransferCapability for InMemoryTransfers {
    async fn create_transfer(
        &self,
        destination: &AgentId,
        amount_cents: i64,
        _metadata: &str,
    ) -> Result<TransferId> {
        if amount_cents <= 0 {
            return Err(ResolveError::TransferFailed {
                reason: "amount must be positive".to_string(),
            });
        }
        *self
            .received
            .write()
            .await
            .entry(destination.clone())
            .or_insert(0) += amount_cents;
        Ok(TransferId::new())
    }
}

/// What authorizes a release
#[derive(Debug, Clone)]
pub enum ReleaseAuthorization {
    /// No dispute was filed; funds go to the payee
    Undisputed,
    /// A binding ruling decides where the funds go
    Ruled {
        ruling: Ruling,
        claimant_id: AgentId,
    },
}

/// The escrow coordinator
#[derive(Clone)]
pub struct EscrowCoordinator {
    accounts: Arc<RwLock<HashMap<TransactionId, EscrowAccount>>>,
    transfers: Arc<dyn TransferCapability>,
    audit: Arc<dyn AuditLog>,
}

impl EscrowCoordinator {
    pub fn new(transfers: Arc<dyn TransferCapability>, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            transfers,
            audit,
        }
    }

    /// Hold funds for a transaction
    pub async fn fund_escrow(
        &self,
        transaction_id: TransactionId,
        payer_id: AgentId,
        payee_id: AgentId,
        amount_cents: i64,
    ) -> Result<EscrowAccount> {
        if amount_cents <= 0 {
            return Err(ResolveError::invalid_input(
                "amount_cents",
                "must be positive",
            ));
        }
        if payer_id == payee_id {
            return Err(ResolveError::invalid_input(
                "payee_id",
                "payer and payee must differ",
            ));
        }

        let account = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&transaction_id) {
                return Err(ResolveError::invalid_input(
                    "transaction_id",
                    "escrow already funded for this transaction",
                ));
            }
            let account = EscrowAccount {
                id: EscrowId::new(),
                transaction_id: transaction_id.clone(),
                payer_id,
                payee_id,
                amount_cents,
                state: EscrowState::Funded,
                transfers: Vec::new(),
                funded_at: Utc::now(),
                settled_at: None,
            };
            accounts.insert(transaction_id.clone(), account.clone());
            account
        };

        self.audit
            .record(
                None,
                AuditAction::EscrowFunded {
                    escrow_id: account.id.clone(),
                    transaction_id,
                },
            )
            .await?;

        info!(escrow = %account.id, amount_cents, "escrow funded");
        Ok(account)
    }

    /// Release held funds per the authorization
    ///
    /// Release happens exactly once: a settled escrow refuses further calls.
    pub async fn release_escrow(
        &self,
        transaction_id: &TransactionId,
        authorization: ReleaseAuthorization,
    ) -> Result<EscrowAccount> {
        let account = {
            let mut accounts = self.accounts.write().await;
            let account = accounts.get_mut(transaction_id).ok_or_else(|| {
                ResolveError::EscrowNotFound {
                    transaction_id: transaction_id.to_string(),
                }
            })?;

            if account.state.is_settled() {
                return Err(ResolveError::EscrowAlreadyReleased {
                    transaction_id: transaction_id.to_string(),
                });
            }

            let (state, legs) = Self::settlement_plan(account, &authorization)?;

            let mut executed = Vec::new();
            for (destination, amount) in legs {
                let transfer_id = self
                    .transfers
                    .create_transfer(
                        &destination,
                        amount,
                        &format!("escrow settlement for {}", transaction_id),
                    )
                    .await?;
                executed.push(SettlementTransfer {
                    transfer_id,
                    destination,
                    amount_cents: amount,
                });
            }

            account.state = state;
            account.transfers = executed;
            account.settled_at = Some(Utc::now());
            account.clone()
        };

        self.audit
            .record(
                None,
                AuditAction::EscrowSettled {
                    escrow_id: account.id.clone(),
                    outcome: format!("{:?}", account.state),
                },
            )
            .await?;

        info!(escrow = %account.id, state = ?account.state, "escrow settled");
        Ok(account)
    }

    /// Current escrow state for a transaction
    pub async fn get_escrow_status(&self, transaction_id: &TransactionId) -> Result<EscrowAccount> {
        self.accounts
            .read()
            .await
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| ResolveError::EscrowNotFound {
                transaction_id: transaction_id.to_string(),
            })
    }

    /// Map an authorization onto settlement legs
    fn settlement_plan(
        account: &EscrowAccount,
        authorization: &ReleaseAuthorization,
    ) -> Result<(EscrowState, Vec<(AgentId, i64)>)> {
        let not_authorized = |reason: &str| ResolveError::ReleaseNotAuthorized {
            transaction_id: account.transaction_id.to_string(),
            reason: reason.to_string(),
        };

        match authorization {
            ReleaseAuthorization::Undisputed => Ok((
                EscrowState::Released,
                vec![(account.payee_id.clone(), account.amount_cents)],
            )),
            ReleaseAuthorization::Ruled {
                ruling,
                claimant_id,
            } => {
                let claimant_is_payer = claimant_id == &account.payer_id;
                let claimant_is_payee = claimant_id == &account.payee_id;
                if !claimant_is_payer && !claimant_is_payee {
                    return Err(not_authorized(
                        "ruling concerns an agent outside this escrow",
                    ));
                }

                match ruling {
                    Ruling::Split => {
                        let payer_share = account.amount_cents / 2;
                        let payee_share = account.amount_cents - payer_share;
                        Ok((
                            EscrowState::Split,
                            vec![
                                (account.payer_id.clone(), payer_share),
                                (account.payee_id.clone(), payee_share),
                            ],
                        ))
                    }
                    Ruling::Claimant => {
                        let destination = if claimant_is_payer {
                            (account.payer_id.clone(), EscrowState::Refunded)
                        } else {
                            (account.payee_id.clone(), EscrowState::Released)
                        };
                        Ok((destination.1, vec![(destination.0, account.amount_cents)]))
                    }
                    // A denied or dismissed claim settles in the respondent's
                    // favor: the transaction stands as transacted
                    Ruling::Respondent | Ruling::Dismissed => {
                        let destination = if claimant_is_payer {
                            (account.payee_id.clone(), EscrowState::Released)
                        } else {
                            (account.payer_id.clone(), EscrowState::Refunded)
                        };
                        Ok((destination.1, vec![(destination.0, account.amount_cents)]))
                    }
                }
            }
        }
    }
}
