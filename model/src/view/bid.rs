use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bid::Bid;
use crate::domain::rfq::Rfq;
use crate::{RfqId, TransporterId, VehicleId};

/// Transporter request to bid on an open RFQ.
///
/// `eta_days` stays a raw integer here so a zero is reported as a business
/// validation failure rather than a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBid {
    pub rfq_id:         RfqId,
    pub transporter_id: TransporterId,
    pub vehicle_id:     VehicleId,
    pub amount:         Decimal,
    pub eta_days:       u32,
    #[serde(default)]
    pub notes:          String,
    pub terms_accepted: bool,
}

/// Caller identity for owner-gated bid transitions (withdraw).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidAction {
    pub transporter_id: TransporterId,
}

/// Outcome of a completed award.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedRfq {
    pub rfq:           Rfq,
    pub winning_bid:   Bid,
    pub rejected_bids: Vec<Bid>,
}
