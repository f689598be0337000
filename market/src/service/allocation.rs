use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use model::domain::bid::{Bid, BidState, EtaDays};
use model::domain::rfq::{Rfq, RfqState};
use model::view::bid::{AwardedRfq, PostBid};
use model::view::notification::{AwardNotice, RejectionNotice};
use model::{BidId, ContractorId, RfqId, TransporterId, VehicleId};
use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

use crate::repository::bid::BidLedger;
use crate::repository::notification::EventNotifier;
use crate::repository::rfq::RfqStore;
use crate::repository::vehicle::VehicleRegistry;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("terms and conditions must be accepted")]
    TermsNotAccepted,
    #[error("bid amount must not be negative")]
    NegativeAmount,
    #[error("estimated delivery must be at least one day")]
    EtaTooShort,
    #[error("RFQ {id} is {actual}, bids are only accepted while it is open")]
    RfqNotOpen { id: RfqId, actual: RfqState },
    #[error("vehicle {vehicle} is not owned by transporter {transporter}")]
    VehicleNotOwned {
        vehicle:     VehicleId,
        transporter: TransporterId,
    },
    #[error("RFQ {0} has no pending bids")]
    NoBids(RfqId),
    #[error("no pending bid of RFQ {0} has a commitment-free vehicle left")]
    NoEligibleBids(RfqId),
    #[error("only the owner may {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Rfq(#[from] crate::repository::rfq::Error),
    #[error(transparent)]
    Ledger(#[from] crate::repository::bid::Error),
    #[error(transparent)]
    Registry(#[from] crate::repository::vehicle::Error),
}

/// The allocation engine: validates bid intake against the vehicle registry
/// and executes the award transition, exactly one winner per RFQ.
pub struct Allocation {
    rfqs:     Arc<RfqStore>,
    bids:     Arc<BidLedger>,
    vehicles: Arc<VehicleRegistry>,
    notifier: Arc<dyn EventNotifier>,
}

impl Allocation {
    pub fn new(
        rfqs: Arc<RfqStore>,
        bids: Arc<BidLedger>,
        vehicles: Arc<VehicleRegistry>,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self { rfqs, bids, vehicles, notifier }
    }

    /// Accept a bid against an open RFQ. Nothing is locked at this point;
    /// the vehicle is only bound at award time.
    pub async fn submit_bid(&self, request: PostBid) -> Result<Bid, Error> {
        trace!("submitting bid: {:?}", request);

        if !request.terms_accepted {
            return Err(Error::TermsNotAccepted);
        }
        if request.amount < Decimal::ZERO {
            return Err(Error::NegativeAmount);
        }
        let eta_days = EtaDays::try_new(request.eta_days)
            .map_err(|_| Error::EtaTooShort)?;

        let rfq = self.rfqs.get(&request.rfq_id).ok_or_else(|| {
            crate::repository::rfq::Error::NotFound(request.rfq_id.clone())
        })?;
        if rfq.state != RfqState::Open {
            return Err(Error::RfqNotOpen { id: rfq.id, actual: rfq.state });
        }

        let vehicle =
            self.vehicles.get(&request.vehicle_id).ok_or_else(|| {
                crate::repository::vehicle::Error::NotFound(
                    request.vehicle_id.clone(),
                )
            })?;
        if vehicle.owner != request.transporter_id {
            return Err(Error::VehicleNotOwned {
                vehicle:     vehicle.id,
                transporter: request.transporter_id,
            });
        }
        if let Some(committed_to) = vehicle.commitment {
            return Err(crate::repository::vehicle::Error::AlreadyCommitted {
                vehicle: vehicle.id,
                committed_to,
            }
            .into());
        }

        let bid = Bid {
            id: BidId::rand(),
            rfq: rfq.id,
            transporter: request.transporter_id,
            vehicle: request.vehicle_id,
            amount: request.amount,
            eta_days,
            notes: request.notes,
            submitted_at: Utc::now(),
            state: BidState::Pending,
        };
        self.bids.insert(bid.clone()).await?;
        Ok(bid)
    }

    /// Withdraw a pending bid; owner-only, and never after award.
    pub async fn withdraw_bid(
        &self,
        id: &BidId,
        requester: &TransporterId,
    ) -> Result<Bid, Error> {
        let bid = self.bids.get(id).await.ok_or_else(|| {
            crate::repository::bid::Error::NotFound(id.clone())
        })?;
        if &bid.transporter != requester {
            return Err(Error::Forbidden("withdraw a bid"));
        }
        Ok(self
            .bids
            .mark(id, BidState::Pending, BidState::Withdrawn)
            .await?)
    }

    /// All bids of the RFQ in canonical order.
    pub async fn list_bids(&self, rfq_id: &RfqId) -> Result<Vec<Bid>, Error> {
        if self.rfqs.get(rfq_id).is_none() {
            return Err(
                crate::repository::rfq::Error::NotFound(rfq_id.clone()).into()
            );
        }
        Ok(self.bids.list_for_rfq(rfq_id).await)
    }

    /// Run the award: take the exclusive gate, pick the deterministic winner
    /// among pending bids whose vehicle is still free, commit, reject the
    /// rest. Any failure aborts back to `open` so the contractor can retry.
    pub async fn award(
        &self,
        rfq_id: &RfqId,
        requester: &ContractorId,
    ) -> Result<AwardedRfq, Error> {
        let rfq = self.rfqs.get(rfq_id).ok_or_else(|| {
            crate::repository::rfq::Error::NotFound(rfq_id.clone())
        })?;
        if &rfq.contractor != requester {
            return Err(Error::Forbidden("award an RFQ"));
        }

        self.rfqs.begin_award(rfq_id)?;

        match self.select_and_commit(rfq_id).await {
            Ok(outcome) => {
                info!(
                    "RFQ {} awarded to bid {} at {}",
                    rfq_id, outcome.winning_bid.id, outcome.winning_bid.amount
                );
                Ok(outcome)
            }
            Err(err) => {
                if let Err(abort) = self.rfqs.abort_award(rfq_id) {
                    warn!(
                        "abort after failed award left RFQ {} untouched: {:?}",
                        rfq_id, abort
                    );
                }
                Err(err)
            }
        }
    }

    async fn select_and_commit(
        &self,
        rfq_id: &RfqId,
    ) -> Result<AwardedRfq, Error> {
        let mut candidates: VecDeque<Bid> = self
            .bids
            .list_for_rfq(rfq_id)
            .await
            .into_iter()
            .filter(|bid| bid.state == BidState::Pending)
            .collect();
        if candidates.is_empty() {
            return Err(Error::NoBids(rfq_id.clone()));
        }

        while let Some(candidate) = candidates.pop_front() {
            // The registry reserve doubles as re-validation: a vehicle
            // consumed by an award on another RFQ since submission drops the
            // candidate here.
            if let Err(err) =
                self.vehicles.reserve(&candidate.vehicle, &candidate.id)
            {
                debug!("candidate {} dropped: {:?}", candidate.id, err);
                continue;
            }

            // A withdrawal that landed between snapshot and now loses the
            // reservation again and drops the candidate.
            let winner = match self
                .bids
                .mark(&candidate.id, BidState::Pending, BidState::Awarded)
                .await
            {
                Ok(winner) => winner,
                Err(err) => {
                    debug!(
                        "candidate {} no longer pending: {:?}",
                        candidate.id, err
                    );
                    let _ = self.vehicles.release(&candidate.vehicle);
                    continue;
                }
            };

            let rfq = match self
                .rfqs
                .commit_award(rfq_id, winner.id.clone())
            {
                Ok(rfq) => rfq,
                Err(err) => {
                    // The gate was tampered with; undo and surface it.
                    let _ = self
                        .bids
                        .mark(&winner.id, BidState::Awarded, BidState::Pending)
                        .await;
                    let _ = self.vehicles.release(&winner.vehicle);
                    return Err(err.into());
                }
            };

            let rejected = self.bids.reject_losers(rfq_id, &winner.id).await;
            self.dispatch_notices(&rfq, &winner, &rejected);
            return Ok(AwardedRfq {
                rfq,
                winning_bid: winner,
                rejected_bids: rejected,
            });
        }

        Err(Error::NoEligibleBids(rfq_id.clone()))
    }

    /// Off the request path: an undeliverable notice never rolls back an
    /// award.
    fn dispatch_notices(&self, rfq: &Rfq, winner: &Bid, rejected: &[Bid]) {
        let notifier = self.notifier.clone();
        let award = AwardNotice::for_bid(rfq, winner);
        let rejections: Vec<RejectionNotice> = rejected
            .iter()
            .map(|bid| RejectionNotice::for_bid(rfq, bid))
            .collect();
        tokio::spawn(async move {
            notifier.notify_award(award).await;
            notifier.notify_rejections(rejections).await;
        });
    }
}
