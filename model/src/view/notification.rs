use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bid::Bid;
use crate::domain::rfq::Rfq;
use crate::{BidId, ContractorId, RfqId, TransporterId, VehicleId};

/// Award event pushed to the notifier endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardNotice {
    pub rfq_id:         RfqId,
    pub contractor_id:  ContractorId,
    pub bid_id:         BidId,
    pub transporter_id: TransporterId,
    pub vehicle_id:     VehicleId,
    pub amount:         Decimal,
}

impl AwardNotice {
    pub fn for_bid(rfq: &Rfq, bid: &Bid) -> Self {
        Self {
            rfq_id:         rfq.id.clone(),
            contractor_id:  rfq.contractor.clone(),
            bid_id:         bid.id.clone(),
            transporter_id: bid.transporter.clone(),
            vehicle_id:     bid.vehicle.clone(),
            amount:         bid.amount,
        }
    }
}

/// Rejection event pushed to the notifier endpoint, one per losing bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionNotice {
    pub rfq_id:         RfqId,
    pub bid_id:         BidId,
    pub transporter_id: TransporterId,
}

impl RejectionNotice {
    pub fn for_bid(rfq: &Rfq, bid: &Bid) -> Self {
        Self {
            rfq_id:         rfq.id.clone(),
            bid_id:         bid.id.clone(),
            transporter_id: bid.transporter.clone(),
        }
    }
}
