use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BidId, ContractorId, RfqId};

/// Lifecycle of a request-for-quotation.
///
/// Every transition is guarded by a compare-and-swap on the store entry, so
/// the legality table below is the whole negotiation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RfqState {
    /// Accepting bids.
    Open,
    /// One award attempt holds the exclusive gate.
    Awarding,
    /// Exactly one bid won; the vehicle is committed.
    Awarded,
    /// Delivery completed, commitment released.
    Closed,
    /// Terminated by the owning contractor before award.
    Cancelled,
    /// Pickup time elapsed with no award.
    Expired,
}

impl RfqState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RfqState::Closed | RfqState::Cancelled | RfqState::Expired
        )
    }

    pub fn may_transition_to(&self, next: RfqState) -> bool {
        matches!(
            (self, next),
            (RfqState::Open, RfqState::Awarding)
                | (RfqState::Open, RfqState::Cancelled)
                | (RfqState::Open, RfqState::Expired)
                | (RfqState::Awarding, RfqState::Awarded)
                | (RfqState::Awarding, RfqState::Open)
                | (RfqState::Awarded, RfqState::Closed)
        )
    }
}

impl fmt::Display for RfqState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RfqState::Open => "open",
            RfqState::Awarding => "awarding",
            RfqState::Awarded => "awarded",
            RfqState::Closed => "closed",
            RfqState::Cancelled => "cancelled",
            RfqState::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

/// A contractor's shipment need, bid on by transporters.
///
/// Never deleted, only terminalized; terminal records stay around for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfq {
    pub id:          RfqId,
    pub contractor:  ContractorId,
    pub source:      String,
    pub destination: String,
    pub description: String,
    pub pickup_at:   DateTime<Utc>,
    pub created_at:  DateTime<Utc>,
    pub state:       RfqState,
    /// Set by the award commit, cleared never.
    pub winning_bid: Option<BidId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_is_the_only_bidding_state() {
        assert!(RfqState::Open.may_transition_to(RfqState::Awarding));
        assert!(RfqState::Open.may_transition_to(RfqState::Cancelled));
        assert!(RfqState::Open.may_transition_to(RfqState::Expired));
        assert!(!RfqState::Open.may_transition_to(RfqState::Awarded));
        assert!(!RfqState::Open.may_transition_to(RfqState::Closed));
    }

    #[test]
    fn awarding_commits_or_aborts() {
        assert!(RfqState::Awarding.may_transition_to(RfqState::Awarded));
        assert!(RfqState::Awarding.may_transition_to(RfqState::Open));
        assert!(!RfqState::Awarding.may_transition_to(RfqState::Cancelled));
        assert!(!RfqState::Awarding.may_transition_to(RfqState::Expired));
    }

    #[test]
    fn terminal_states_stay_terminal() {
        for terminal in
            [RfqState::Closed, RfqState::Cancelled, RfqState::Expired]
        {
            assert!(terminal.is_terminal());
            for next in [
                RfqState::Open,
                RfqState::Awarding,
                RfqState::Awarded,
                RfqState::Closed,
                RfqState::Cancelled,
                RfqState::Expired,
            ] {
                assert!(!terminal.may_transition_to(next));
            }
        }
    }

    #[test]
    fn awarded_only_closes() {
        assert!(RfqState::Awarded.may_transition_to(RfqState::Closed));
        assert!(!RfqState::Awarded.may_transition_to(RfqState::Open));
        assert!(!RfqState::Awarded.may_transition_to(RfqState::Cancelled));
    }
}
