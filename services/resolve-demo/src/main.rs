//! Resolve Demo - One-command dispute walkthrough
//!
//! Drives a full dispute through the exposed operation surface: two agents
//! register, transact into escrow, fall out over delivery, submit evidence,
//! receive a ruling, accept it, and settle the escrow under that ruling.
//!
//! # Quick Start
//!
//! ```bash
//! # Deterministic arbiter, no model required
//! resolve-demo
//!
//! # Against an OpenAI-compatible endpoint
//! RESOLVE_ARBITER_URL=http://localhost:11434/v1 resolve-demo --provider http
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use resolve_sdk::{
    ClaimType, DeterministicRulingProvider, EvidenceContent, EvidenceKind, FeedbackRatings,
    FileDisputeRequest, HttpRulingProvider, OperatorId, ResolveService, RulingProvider,
    ServiceOptions, TransactionId,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve Demo - trust, arbitration, and escrow for agent commerce
#[derive(Parser, Debug)]
#[command(name = "resolve-demo", about = "Walk a dispute from filing to settled escrow", version)]
struct Args {
    /// Ruling provider: "deterministic" or "http"
    #[arg(long, default_value = "deterministic", env = "RESOLVE_PROVIDER")]
    provider: String,

    /// Stated value of the disputed transaction, in cents
    #[arg(long, default_value_t = 4_000, env = "RESOLVE_DEMO_VALUE_CENTS")]
    value_cents: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let provider: Arc<dyn RulingProvider> = match args.provider.as_str() {
        "deterministic" => Arc::new(DeterministicRulingProvider::new()),
        "http" => Arc::new(HttpRulingProvider::from_env()),
        other => bail!("unknown provider: {other}"),
    };
    info!(provider = provider.name(), "starting resolve demo");

    let service = ResolveService::new(ServiceOptions::in_memory(provider));

    // Two agents under different operators
    let buyer = service
        .register_agent(OperatorId::new(), "buyer-bot")
        .await
        .into_data();
    let seller = service
        .register_agent(OperatorId::new(), "seller-bot")
        .await
        .into_data();
    info!(buyer = %buyer.id, seller = %seller.id, "agents registered");

    // A transaction settles into escrow before any dispute
    let transaction_id = TransactionId::new();
    service
        .fund_escrow(
            transaction_id.clone(),
            buyer.id.clone(),
            seller.id.clone(),
            args.value_cents,
        )
        .await
        .into_data();
    info!(transaction = %transaction_id, cents = args.value_cents, "escrow funded");

    // The buyer claims non-performance
    let dispute = service
        .file_dispute(FileDisputeRequest {
            claimant_id: buyer.id.clone(),
            respondent_id: seller.id.clone(),
            transaction_id: transaction_id.clone(),
            claim_type: ClaimType::NonPerformance,
            claim_summary: "Purchased crawl never produced output".to_string(),
            claim_details: "The job was paid up front and never even started; \
                            the seller stopped answering messages."
                .to_string(),
            requested_resolution: "Full refund of the escrowed amount".to_string(),
            stated_value_cents: args.value_cents,
        })
        .await
        .into_data();
    info!(dispute = %dispute.id, free = dispute.was_free, "dispute filed");

    service
        .respond_to_dispute(&dispute.id, &seller.id)
        .await
        .into_data();

    // Evidence from both sides; the buyer substantiates more fully
    for (title, body) in [
        ("payment receipt", "Paid in full on order day; receipt attached."),
        ("unanswered reminders", "Three delivery reminders over ten days, all ignored."),
    ] {
        service
            .submit_evidence(
                &dispute.id,
                &buyer.id,
                EvidenceKind::Correspondence,
                title,
                EvidenceContent::Text(body.to_string()),
            )
            .await
            .into_data();
    }
    service
        .submit_evidence(
            &dispute.id,
            &seller.id,
            EvidenceKind::WorkProduct,
            "scheduler log",
            EvidenceContent::Text("Job was queued; worker never picked it up.".to_string()),
        )
        .await
        .into_data();

    service
        .complete_evidence(&dispute.id, &buyer.id)
        .await
        .into_data();
    let ruled = service
        .complete_evidence(&dispute.id, &seller.id)
        .await
        .into_data();
    let ruling = ruled.ruling.context("dispute should be ruled")?;
    info!(
        ruling = %ruling,
        reasoning = ruled.ruling_reasoning.as_deref().unwrap_or(""),
        "ruling issued"
    );

    service
        .accept_decision(&dispute.id, &buyer.id)
        .await
        .into_data();
    let closed = service
        .accept_decision(&dispute.id, &seller.id)
        .await
        .into_data();
    info!(status = %closed.status, "both parties accepted");

    // Trust moved under the value-banded policy
    for agent in [&buyer, &seller] {
        let trust = service.get_agent_trust(&agent.id).await.into_data();
        info!(
            agent = %trust.agent.external_ref,
            score = trust.agent.trust_score,
            won = trust.agent.disputes_won,
            lost = trust.agent.disputes_lost,
            "trust after ruling"
        );
    }

    // The winner rates the decision
    service
        .submit_feedback(
            &dispute.id,
            &buyer.id,
            FeedbackRatings {
                fairness: 5,
                reasoning: 4,
                evidence_handling: 5,
            },
            Some("Quick and well reasoned.".to_string()),
        )
        .await
        .into_data();

    // Escrow settles under the binding ruling
    let settled = service.release_escrow(&transaction_id).await.into_data();
    info!(state = ?settled.state, transfers = settled.transfers.len(), "escrow settled");

    Ok(())
}
