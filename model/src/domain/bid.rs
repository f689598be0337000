use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use nutype::nutype;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BidId, RfqId, TransporterId, VehicleId};

/// Estimated delivery duration, in whole days.
#[nutype(
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize
    ),
    validate(greater_or_equal = 1)
)]
pub struct EtaDays(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BidState {
    /// Submitted, competing for the award.
    Pending,
    /// Selected as the single winner of its RFQ.
    Awarded,
    /// Lost the award to another bid.
    Rejected,
    /// Pulled back by its transporter before award.
    Withdrawn,
}

impl fmt::Display for BidState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BidState::Pending => "pending",
            BidState::Awarded => "awarded",
            BidState::Rejected => "rejected",
            BidState::Withdrawn => "withdrawn",
        };
        write!(f, "{}", name)
    }
}

/// A transporter's priced, vehicle-backed offer against an RFQ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id:           BidId,
    pub rfq:          RfqId,
    pub transporter:  TransporterId,
    pub vehicle:      VehicleId,
    pub amount:       Decimal,
    pub eta_days:     EtaDays,
    pub notes:        String,
    pub submitted_at: DateTime<Utc>,
    pub state:        BidState,
}

impl Bid {
    /// Canonical candidate order: cheapest first, earliest submission breaks
    /// an amount tie, lowest id breaks a timestamp tie. Total, so any given
    /// bid set always produces the same winner.
    pub fn candidate_order(a: &Bid, b: &Bid) -> Ordering {
        a.amount
            .cmp(&b.amount)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn bid(amount: i64, submitted_at: DateTime<Utc>) -> Bid {
        Bid {
            id:           BidId::rand(),
            rfq:          RfqId::from(Uuid::nil()),
            transporter:  TransporterId::rand(),
            vehicle:      VehicleId::rand(),
            amount:       Decimal::new(amount, 0),
            eta_days:     EtaDays::try_new(3).unwrap(),
            notes:        String::new(),
            submitted_at,
            state:        BidState::Pending,
        }
    }

    #[test]
    fn cheapest_bid_wins_regardless_of_submission_order() {
        let t = |m| Utc.with_ymd_and_hms(2026, 3, 1, 10, m, 0).unwrap();
        let a = bid(500, t(0));
        let b = bid(500, t(1));
        let c = bid(450, t(5));

        let mut bids = vec![a.clone(), b.clone(), c.clone()];
        bids.sort_unstable_by(Bid::candidate_order);
        assert_eq!(bids[0].id, c.id);
    }

    #[test]
    fn earlier_submission_breaks_an_amount_tie() {
        let t = |m| Utc.with_ymd_and_hms(2026, 3, 1, 9, m, 0).unwrap();
        let late = bid(500, t(60));
        let early = bid(500, t(59));

        let mut bids = vec![late.clone(), early.clone()];
        bids.sort_unstable_by(Bid::candidate_order);
        assert_eq!(bids[0].id, early.id);
        assert_eq!(bids[1].id, late.id);
    }

    #[test]
    fn lowest_id_breaks_a_full_tie() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut x = bid(500, t);
        let mut y = bid(500, t);
        x.id = BidId::from(Uuid::from_u128(1));
        y.id = BidId::from(Uuid::from_u128(2));

        let mut bids = vec![y.clone(), x.clone()];
        bids.sort_unstable_by(Bid::candidate_order);
        assert_eq!(bids[0].id, x.id);
    }

    #[test]
    fn eta_must_be_at_least_one_day() {
        assert!(EtaDays::try_new(0).is_err());
        assert!(EtaDays::try_new(1).is_ok());
    }
}
