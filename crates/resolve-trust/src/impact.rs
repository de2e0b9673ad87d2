//! Pure trust-impact arithmetic
//!
//! No I/O lives here. The policy constants are configuration, not physics:
//! deployments may tune them, but the ordinal relationships must hold
//! (win > split > small loss > medium loss > large loss > dismissal).

use resolve_types::{PartyRole, Ruling, TRUST_SCORE_MAX, TRUST_SCORE_MIN};
use serde::{Deserialize, Serialize};

/// Trust delta policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Granted to the winner of a CLAIMANT or RESPONDENT ruling
    pub win_delta: i32,
    /// Taken from the loser when the stated value is below `medium_value_cents`
    pub small_loss_delta: i32,
    /// Taken from the loser from `medium_value_cents` up to `large_value_cents`
    pub medium_loss_delta: i32,
    /// Taken from the loser at `large_value_cents` and above
    pub large_loss_delta: i32,
    /// Applied to both parties on a SPLIT ruling
    pub split_delta: i32,
    /// Applied to the claimant on a DISMISSED ruling (frivolous-claim penalty)
    pub dismissal_delta: i32,
    /// Granted for an undisputed transaction completion
    pub completion_delta: i32,
    /// Lower bound of the medium loss band, smallest currency unit
    pub medium_value_cents: i64,
    /// Lower bound of the large loss band, smallest currency unit
    pub large_value_cents: i64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            win_delta: 2,
            small_loss_delta: -3,
            medium_loss_delta: -5,
            large_loss_delta: -10,
            split_delta: -1,
            dismissal_delta: -5,
            completion_delta: 1,
            medium_value_cents: 10_000,
            large_value_cents: 100_000,
        }
    }
}

impl TrustPolicy {
    /// The loss delta for a given stated value
    fn loss_delta(&self, stated_value_cents: i64) -> i32 {
        if stated_value_cents >= self.large_value_cents {
            self.large_loss_delta
        } else if stated_value_cents >= self.medium_value_cents {
            self.medium_loss_delta
        } else {
            self.small_loss_delta
        }
    }
}

/// Compute the trust delta a ruling applies to one party
///
/// `is_winner` says whether the party in question is the one the ruling
/// favors. For SPLIT rulings both parties take the split delta; for
/// DISMISSED the claimant (never the winner of a dismissal) takes the
/// dismissal penalty and the respondent is untouched.
pub fn calculate_trust_impact(
    policy: &TrustPolicy,
    ruling: Ruling,
    stated_value_cents: i64,
    is_winner: bool,
) -> i32 {
    match ruling {
        Ruling::Claimant | Ruling::Respondent => {
            if is_winner {
                policy.win_delta
            } else {
                policy.loss_delta(stated_value_cents)
            }
        }
        Ruling::Split => policy.split_delta,
        Ruling::Dismissed => {
            if is_winner {
                0
            } else {
                policy.dismissal_delta
            }
        }
    }
}

/// Trust delta for one side of a dispute under a ruling
pub fn impact_for_role(
    policy: &TrustPolicy,
    ruling: Ruling,
    stated_value_cents: i64,
    role: PartyRole,
) -> i32 {
    match ruling {
        // Dismissal penalizes only the claimant
        Ruling::Dismissed => calculate_trust_impact(
            policy,
            ruling,
            stated_value_cents,
            role == PartyRole::Respondent,
        ),
        _ => calculate_trust_impact(policy, ruling, stated_value_cents, ruling.is_winner(role)),
    }
}

/// Clamp a score into the trust scale
pub fn clamp_score(score: i32) -> i32 {
    score.clamp(TRUST_SCORE_MIN, TRUST_SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TrustPolicy {
        TrustPolicy::default()
    }

    #[test]
    fn test_winner_gains() {
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Claimant, 5_000, true),
            2
        );
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Respondent, 250_000, true),
            2
        );
    }

    #[test]
    fn test_loss_bands() {
        // $40 -> small band
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Claimant, 4_000, false),
            -3
        );
        // $500 -> medium band
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Respondent, 50_000, false),
            -5
        );
        // $1,500 -> large band
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Respondent, 150_000, false),
            -10
        );
        // Band edges
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Claimant, 9_999, false),
            -3
        );
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Claimant, 10_000, false),
            -5
        );
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Claimant, 100_000, false),
            -10
        );
    }

    #[test]
    fn test_split_hits_both() {
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Split, 50_000, true),
            -1
        );
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Split, 50_000, false),
            -1
        );
    }

    #[test]
    fn test_dismissal_penalizes_claimant_only() {
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Dismissed, 50_000, false),
            -5
        );
        assert_eq!(
            calculate_trust_impact(&policy(), Ruling::Dismissed, 50_000, true),
            0
        );
        assert_eq!(
            impact_for_role(&policy(), Ruling::Dismissed, 50_000, PartyRole::Claimant),
            -5
        );
        assert_eq!(
            impact_for_role(&policy(), Ruling::Dismissed, 50_000, PartyRole::Respondent),
            0
        );
    }

    #[test]
    fn test_impact_for_role_matches_winner() {
        assert_eq!(
            impact_for_role(&policy(), Ruling::Claimant, 4_000, PartyRole::Claimant),
            2
        );
        assert_eq!(
            impact_for_role(&policy(), Ruling::Claimant, 4_000, PartyRole::Respondent),
            -3
        );
        assert_eq!(
            impact_for_role(&policy(), Ruling::Respondent, 150_000, PartyRole::Claimant),
            -10
        );
    }

    #[test]
    fn test_ordinal_relationships_hold() {
        let p = policy();
        assert!(p.win_delta > p.split_delta);
        assert!(p.split_delta > p.small_loss_delta);
        assert!(p.small_loss_delta > p.medium_loss_delta);
        assert!(p.medium_loss_delta >= p.dismissal_delta);
        assert!(p.medium_loss_delta > p.large_loss_delta);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_score(-4), 0);
        assert_eq!(clamp_score(104), 100);
        assert_eq!(clamp_score(57), 57);
    }
}
