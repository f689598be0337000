use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use model::view::bid::{BidAction, PostBid};
use model::view::rfq::{PostRfq, RfqAction};
use model::view::vehicle::{FleetQuery, PostVehicle};
use model::{BidId, RfqId};
use tracing::error;

use crate::controller::{self, ControllerError};
use crate::prom_metrics::{
    AWARDED_RFQS_COUNT, FAILED_AWARDS_COUNT, SUBMITTED_BIDS_COUNT,
};
use crate::repository::{bid, rfq, vehicle};
use crate::service::{allocation, fleet, rfq_life};

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ControllerError::RfqLife(err) => rfq_life_status(err),
            ControllerError::Allocation(err) => allocation_status(err),
            ControllerError::Fleet(err) => fleet_status(err),
        }
    }

    fn error_response(&self) -> HttpResponse {
        error!("{:?}", self);
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

fn rfq_store_status(err: &rfq::Error) -> StatusCode {
    match err {
        rfq::Error::NotFound(_) => StatusCode::NOT_FOUND,
        rfq::Error::InvalidState { .. } => StatusCode::CONFLICT,
    }
}

fn ledger_status(err: &bid::Error) -> StatusCode {
    match err {
        bid::Error::NotFound(_) => StatusCode::NOT_FOUND,
        bid::Error::DuplicatePending { .. } => StatusCode::CONFLICT,
        bid::Error::InvalidState { .. } => StatusCode::CONFLICT,
    }
}

fn registry_status(err: &vehicle::Error) -> StatusCode {
    match err {
        vehicle::Error::NotFound(_) => StatusCode::NOT_FOUND,
        vehicle::Error::AlreadyCommitted { .. } => StatusCode::CONFLICT,
        vehicle::Error::DuplicateRegistration(_) => StatusCode::CONFLICT,
    }
}

fn rfq_life_status(err: &rfq_life::Error) -> StatusCode {
    match err {
        rfq_life::Error::MissingField(_) => StatusCode::BAD_REQUEST,
        rfq_life::Error::PickupNotInFuture(_) => StatusCode::BAD_REQUEST,
        rfq_life::Error::Forbidden(_) => StatusCode::FORBIDDEN,
        rfq_life::Error::Store(err) => rfq_store_status(err),
    }
}

fn allocation_status(err: &allocation::Error) -> StatusCode {
    match err {
        allocation::Error::TermsNotAccepted
        | allocation::Error::NegativeAmount
        | allocation::Error::EtaTooShort
        | allocation::Error::NoBids(_) => StatusCode::UNPROCESSABLE_ENTITY,
        allocation::Error::RfqNotOpen { .. }
        | allocation::Error::NoEligibleBids(_) => StatusCode::CONFLICT,
        allocation::Error::VehicleNotOwned { .. }
        | allocation::Error::Forbidden(_) => StatusCode::FORBIDDEN,
        allocation::Error::Rfq(err) => rfq_store_status(err),
        allocation::Error::Ledger(err) => ledger_status(err),
        allocation::Error::Registry(err) => registry_status(err),
    }
}

fn fleet_status(err: &fleet::Error) -> StatusCode {
    match err {
        fleet::Error::MissingField(_) => StatusCode::BAD_REQUEST,
        fleet::Error::Registry(err) => registry_status(err),
    }
}

/// Open a new RFQ for bidding.
pub async fn post_rfq(
    payload: Json<PostRfq>,
    rfq_life: Data<rfq_life::RfqLife>,
) -> Result<HttpResponse, ControllerError> {
    let rfq = controller::create_rfq(payload.0, &rfq_life).await?;
    Ok(HttpResponse::Created().json(rfq))
}

pub async fn get_rfq(
    path: Path<RfqId>,
    rfq_life: Data<rfq_life::RfqLife>,
) -> Result<HttpResponse, ControllerError> {
    let rfq = controller::get_rfq(path.into_inner(), &rfq_life).await?;
    Ok(HttpResponse::Ok().json(rfq))
}

/// Every RFQ, newest first.
pub async fn get_rfqs(
    rfq_life: Data<rfq_life::RfqLife>,
) -> Result<HttpResponse, ControllerError> {
    let rfqs = controller::list_rfqs(&rfq_life).await;
    Ok(HttpResponse::Ok().json(rfqs))
}

pub async fn post_cancel_rfq(
    path: Path<RfqId>,
    payload: Json<RfqAction>,
    rfq_life: Data<rfq_life::RfqLife>,
) -> Result<HttpResponse, ControllerError> {
    let rfq =
        controller::cancel_rfq(path.into_inner(), payload.0, &rfq_life)
            .await?;
    Ok(HttpResponse::Ok().json(rfq))
}

/// Run the award for an RFQ and return the winner plus the rejected bids.
pub async fn post_award_rfq(
    path: Path<RfqId>,
    payload: Json<RfqAction>,
    allocation: Data<allocation::Allocation>,
) -> Result<HttpResponse, ControllerError> {
    let rfq_id = path.into_inner();
    let res =
        controller::award_rfq(rfq_id.clone(), payload.0, &allocation).await;
    match res {
        Ok(_) => {
            AWARDED_RFQS_COUNT
                .with_label_values(&[&rfq_id.to_string()])
                .inc();
        }
        Err(_) => {
            FAILED_AWARDS_COUNT
                .with_label_values(&[&rfq_id.to_string()])
                .inc();
        }
    }
    Ok(HttpResponse::Ok().json(res?))
}

/// Delivery-complete signal; closes the RFQ and releases the vehicle.
pub async fn post_rfq_delivered(
    path: Path<RfqId>,
    payload: Json<RfqAction>,
    rfq_life: Data<rfq_life::RfqLife>,
) -> Result<HttpResponse, ControllerError> {
    let rfq =
        controller::rfq_delivered(path.into_inner(), payload.0, &rfq_life)
            .await?;
    Ok(HttpResponse::Ok().json(rfq))
}

/// All bids of an RFQ in canonical order (amount, submission time, id).
pub async fn get_bids(
    path: Path<RfqId>,
    allocation: Data<allocation::Allocation>,
) -> Result<HttpResponse, ControllerError> {
    let bids = controller::list_bids(path.into_inner(), &allocation).await?;
    Ok(HttpResponse::Ok().json(bids))
}

pub async fn post_bid(
    payload: Json<PostBid>,
    allocation: Data<allocation::Allocation>,
) -> Result<HttpResponse, ControllerError> {
    let bid = controller::submit_bid(payload.0, &allocation).await?;
    SUBMITTED_BIDS_COUNT
        .with_label_values(&[&bid.rfq.to_string()])
        .inc();
    Ok(HttpResponse::Created().json(bid))
}

pub async fn post_withdraw_bid(
    path: Path<BidId>,
    payload: Json<BidAction>,
    allocation: Data<allocation::Allocation>,
) -> Result<HttpResponse, ControllerError> {
    let bid =
        controller::withdraw_bid(path.into_inner(), payload.0, &allocation)
            .await?;
    Ok(HttpResponse::Ok().json(bid))
}

pub async fn post_vehicle(
    payload: Json<PostVehicle>,
    fleet: Data<fleet::Fleet>,
) -> Result<HttpResponse, ControllerError> {
    let record = controller::register_vehicle(payload.0, &fleet).await?;
    Ok(HttpResponse::Created().json(record))
}

pub async fn get_vehicles(
    query: Query<FleetQuery>,
    fleet: Data<fleet::Fleet>,
) -> Result<HttpResponse, ControllerError> {
    let records =
        controller::list_vehicles(query.into_inner().transporter_id, &fleet)
            .await;
    Ok(HttpResponse::Ok().json(records))
}

pub async fn health() -> HttpResponse { HttpResponse::Ok().finish() }
