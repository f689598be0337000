use std::sync::Arc;

use chrono::{DateTime, Utc};
use model::domain::rfq::{Rfq, RfqState};
use model::view::rfq::PostRfq;
use model::{ContractorId, RfqId};
use tracing::{trace, warn};

use crate::repository::bid::BidLedger;
use crate::repository::rfq::RfqStore;
use crate::repository::vehicle::VehicleRegistry;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("pickup time {0} is not in the future")]
    PickupNotInFuture(DateTime<Utc>),
    #[error("only the owning contractor may {0} an RFQ")]
    Forbidden(&'static str),
    #[error(transparent)]
    Store(#[from] crate::repository::rfq::Error),
}

/// RFQ lifecycle outside the award path: creation, contractor cancellation,
/// and the delivery-complete close that clears the vehicle commitment.
pub struct RfqLife {
    rfqs:     Arc<RfqStore>,
    bids:     Arc<BidLedger>,
    vehicles: Arc<VehicleRegistry>,
}

impl RfqLife {
    pub fn new(
        rfqs: Arc<RfqStore>,
        bids: Arc<BidLedger>,
        vehicles: Arc<VehicleRegistry>,
    ) -> Self {
        Self { rfqs, bids, vehicles }
    }

    pub async fn create(&self, request: PostRfq) -> Result<Rfq, Error> {
        trace!("creating RFQ: {:?}", request);

        for (field, value) in [
            ("source", &request.source),
            ("destination", &request.destination),
            ("description", &request.description),
        ] {
            if value.trim().is_empty() {
                return Err(Error::MissingField(field));
            }
        }
        let now = Utc::now();
        if request.pickup_at <= now {
            return Err(Error::PickupNotInFuture(request.pickup_at));
        }

        let rfq = Rfq {
            id: RfqId::rand(),
            contractor: request.contractor_id,
            source: request.source,
            destination: request.destination,
            description: request.description,
            pickup_at: request.pickup_at,
            created_at: now,
            state: RfqState::Open,
            winning_bid: None,
        };
        self.rfqs.insert(rfq.clone());
        Ok(rfq)
    }

    pub async fn get(&self, id: &RfqId) -> Result<Rfq, Error> {
        self.rfqs
            .get(id)
            .ok_or_else(|| {
                crate::repository::rfq::Error::NotFound(id.clone()).into()
            })
    }

    pub async fn list(&self) -> Vec<Rfq> { self.rfqs.list() }

    pub async fn cancel(
        &self,
        id: &RfqId,
        requester: &ContractorId,
    ) -> Result<Rfq, Error> {
        let rfq = self.get(id).await?;
        if &rfq.contractor != requester {
            return Err(Error::Forbidden("cancel"));
        }
        Ok(self.rfqs.cancel(id)?)
    }

    /// The external delivery-complete signal: close the awarded RFQ and
    /// release the vehicle its winning bid committed.
    pub async fn delivered(
        &self,
        id: &RfqId,
        requester: &ContractorId,
    ) -> Result<Rfq, Error> {
        let rfq = self.get(id).await?;
        if &rfq.contractor != requester {
            return Err(Error::Forbidden("close"));
        }
        let rfq = self.rfqs.close(id)?;

        if let Some(winning_bid) = &rfq.winning_bid {
            match self.bids.get(winning_bid).await {
                Some(bid) => {
                    if let Err(err) = self.vehicles.release(&bid.vehicle) {
                        warn!(
                            "vehicle {} of delivered RFQ {} was not released: {:?}",
                            bid.vehicle, id, err
                        );
                    }
                }
                None => warn!(
                    "winning bid {} of delivered RFQ {} is missing from the ledger",
                    winning_bid, id
                ),
            }
        }
        Ok(rfq)
    }
}
