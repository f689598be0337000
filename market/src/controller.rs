use std::sync::Arc;

use model::domain::bid::Bid;
use model::domain::rfq::Rfq;
use model::dto::vehicle::VehicleRecord;
use model::view::bid::{AwardedRfq, BidAction, PostBid};
use model::view::rfq::{PostRfq, RfqAction};
use model::view::vehicle::PostVehicle;
use model::{BidId, RfqId, TransporterId};
use tracing::trace;

use crate::service::{allocation, fleet, rfq_life};

#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    RfqLife(#[from] rfq_life::Error),
    #[error(transparent)]
    Allocation(#[from] allocation::Error),
    #[error(transparent)]
    Fleet(#[from] fleet::Error),
}

/// Open a new RFQ for bidding.
pub async fn create_rfq(
    payload: PostRfq,
    rfq_life: &Arc<rfq_life::RfqLife>,
) -> Result<Rfq, ControllerError> {
    Ok(rfq_life.create(payload).await?)
}

pub async fn get_rfq(
    rfq_id: RfqId,
    rfq_life: &Arc<rfq_life::RfqLife>,
) -> Result<Rfq, ControllerError> {
    Ok(rfq_life.get(&rfq_id).await?)
}

/// Every RFQ, newest first, for the dashboards.
pub async fn list_rfqs(rfq_life: &Arc<rfq_life::RfqLife>) -> Vec<Rfq> {
    trace!("listing RFQs");
    rfq_life.list().await
}

pub async fn cancel_rfq(
    rfq_id: RfqId,
    action: RfqAction,
    rfq_life: &Arc<rfq_life::RfqLife>,
) -> Result<Rfq, ControllerError> {
    trace!("cancelling RFQ {}: {:?}", rfq_id, action);
    Ok(rfq_life.cancel(&rfq_id, &action.contractor_id).await?)
}

/// Run the award and settle every bid of the RFQ in one pass.
pub async fn award_rfq(
    rfq_id: RfqId,
    action: RfqAction,
    allocation: &Arc<allocation::Allocation>,
) -> Result<AwardedRfq, ControllerError> {
    trace!("awarding RFQ {}: {:?}", rfq_id, action);
    Ok(allocation.award(&rfq_id, &action.contractor_id).await?)
}

/// Delivery-complete signal from the contractor.
pub async fn rfq_delivered(
    rfq_id: RfqId,
    action: RfqAction,
    rfq_life: &Arc<rfq_life::RfqLife>,
) -> Result<Rfq, ControllerError> {
    trace!("closing delivered RFQ {}: {:?}", rfq_id, action);
    Ok(rfq_life.delivered(&rfq_id, &action.contractor_id).await?)
}

pub async fn submit_bid(
    payload: PostBid,
    allocation: &Arc<allocation::Allocation>,
) -> Result<Bid, ControllerError> {
    Ok(allocation.submit_bid(payload).await?)
}

pub async fn withdraw_bid(
    bid_id: BidId,
    action: BidAction,
    allocation: &Arc<allocation::Allocation>,
) -> Result<Bid, ControllerError> {
    trace!("withdrawing bid {}: {:?}", bid_id, action);
    Ok(allocation.withdraw_bid(&bid_id, &action.transporter_id).await?)
}

/// All bids of an RFQ in canonical order.
pub async fn list_bids(
    rfq_id: RfqId,
    allocation: &Arc<allocation::Allocation>,
) -> Result<Vec<Bid>, ControllerError> {
    Ok(allocation.list_bids(&rfq_id).await?)
}

pub async fn register_vehicle(
    payload: PostVehicle,
    fleet: &Arc<fleet::Fleet>,
) -> Result<VehicleRecord, ControllerError> {
    Ok(fleet.register(payload).await?)
}

pub async fn list_vehicles(
    transporter: TransporterId,
    fleet: &Arc<fleet::Fleet>,
) -> Vec<VehicleRecord> {
    trace!("listing fleet of {}", transporter);
    fleet.owned_by(&transporter).await
}
