use std::collections::HashMap;

use model::domain::bid::{Bid, BidState};
use model::{BidId, RfqId, VehicleId};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bid {0} does not exist")]
    NotFound(BidId),
    #[error("a pending bid for vehicle {vehicle} on RFQ {rfq} already exists")]
    DuplicatePending { rfq: RfqId, vehicle: VehicleId },
    #[error("bid {id} is {actual}, expected {expected}")]
    InvalidState {
        id:       BidId,
        expected: BidState,
        actual:   BidState,
    },
}

/// Ledger of every bid ever submitted. One write guard spans each
/// check-then-mutate sequence, so the uniqueness and state rules below hold
/// under concurrent submissions.
#[derive(Debug, Default)]
pub struct BidLedger {
    bids: RwLock<HashMap<BidId, Bid>>,
}

impl BidLedger {
    pub fn new() -> Self { Self::default() }

    /// Refuses a second pending bid for the same (RFQ, vehicle) pair instead
    /// of silently overwriting the first.
    pub async fn insert(&self, bid: Bid) -> Result<(), Error> {
        let mut bids = self.bids.write().await;
        let duplicate = bids.values().any(|existing| {
            existing.rfq == bid.rfq
                && existing.vehicle == bid.vehicle
                && existing.state == BidState::Pending
        });
        if duplicate {
            return Err(Error::DuplicatePending {
                rfq:     bid.rfq.clone(),
                vehicle: bid.vehicle.clone(),
            });
        }
        bids.insert(bid.id.clone(), bid);
        Ok(())
    }

    pub async fn get(&self, id: &BidId) -> Option<Bid> {
        self.bids.read().await.get(id).cloned()
    }

    /// All bids of an RFQ in canonical order: (amount asc, submitted_at asc,
    /// id asc). This is both the display order and the award-candidate
    /// order.
    pub async fn list_for_rfq(&self, rfq: &RfqId) -> Vec<Bid> {
        let mut list: Vec<Bid> = self
            .bids
            .read()
            .await
            .values()
            .filter(|bid| &bid.rfq == rfq)
            .cloned()
            .collect();
        list.sort_unstable_by(Bid::candidate_order);
        list
    }

    /// Compare-and-swap on one bid's state; a bid that moved away from
    /// `expected` (e.g. withdrawn mid-award) is reported, never overwritten.
    pub async fn mark(
        &self,
        id: &BidId,
        expected: BidState,
        next: BidState,
    ) -> Result<Bid, Error> {
        let mut bids = self.bids.write().await;
        let bid =
            bids.get_mut(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        if bid.state != expected {
            return Err(Error::InvalidState {
                id:       id.clone(),
                expected,
                actual:   bid.state,
            });
        }
        bid.state = next;
        Ok(bid.clone())
    }

    /// Reject every still-pending bid of the RFQ except the winner, in one
    /// guard. Returns the losers in canonical order.
    pub async fn reject_losers(
        &self,
        rfq: &RfqId,
        winner: &BidId,
    ) -> Vec<Bid> {
        let mut bids = self.bids.write().await;
        let mut rejected = Vec::new();
        for bid in bids.values_mut() {
            if &bid.rfq == rfq
                && &bid.id != winner
                && bid.state == BidState::Pending
            {
                bid.state = BidState::Rejected;
                rejected.push(bid.clone());
            }
        }
        rejected.sort_unstable_by(Bid::candidate_order);
        rejected
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use model::domain::bid::EtaDays;
    use model::TransporterId;
    use rust_decimal::Decimal;

    use super::*;

    fn pending(rfq: &RfqId, vehicle: &VehicleId, amount: i64) -> Bid {
        Bid {
            id:           BidId::rand(),
            rfq:          rfq.clone(),
            transporter:  TransporterId::rand(),
            vehicle:      vehicle.clone(),
            amount:       Decimal::new(amount, 0),
            eta_days:     EtaDays::try_new(2).unwrap(),
            notes:        String::new(),
            submitted_at: Utc::now(),
            state:        BidState::Pending,
        }
    }

    #[tokio::test]
    async fn second_pending_bid_for_same_rfq_and_vehicle_is_refused() {
        let ledger = BidLedger::new();
        let rfq = RfqId::rand();
        let vehicle = VehicleId::rand();

        ledger.insert(pending(&rfq, &vehicle, 500)).await.unwrap();
        assert!(matches!(
            ledger.insert(pending(&rfq, &vehicle, 400)).await,
            Err(Error::DuplicatePending { .. })
        ));
    }

    #[tokio::test]
    async fn withdrawn_bid_frees_the_pair_for_a_new_bid() {
        let ledger = BidLedger::new();
        let rfq = RfqId::rand();
        let vehicle = VehicleId::rand();

        let first = pending(&rfq, &vehicle, 500);
        let first_id = first.id.clone();
        ledger.insert(first).await.unwrap();
        ledger
            .mark(&first_id, BidState::Pending, BidState::Withdrawn)
            .await
            .unwrap();

        assert!(ledger.insert(pending(&rfq, &vehicle, 450)).await.is_ok());
    }

    #[tokio::test]
    async fn same_vehicle_may_back_bids_on_different_rfqs() {
        let ledger = BidLedger::new();
        let vehicle = VehicleId::rand();

        ledger
            .insert(pending(&RfqId::rand(), &vehicle, 500))
            .await
            .unwrap();
        assert!(ledger
            .insert(pending(&RfqId::rand(), &vehicle, 600))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn mark_refuses_a_stale_expectation() {
        let ledger = BidLedger::new();
        let rfq = RfqId::rand();
        let bid = pending(&rfq, &VehicleId::rand(), 500);
        let id = bid.id.clone();
        ledger.insert(bid).await.unwrap();

        ledger
            .mark(&id, BidState::Pending, BidState::Withdrawn)
            .await
            .unwrap();
        assert!(matches!(
            ledger.mark(&id, BidState::Pending, BidState::Awarded).await,
            Err(Error::InvalidState { actual: BidState::Withdrawn, .. })
        ));
    }

    #[tokio::test]
    async fn reject_losers_spares_winner_and_withdrawn() {
        let ledger = BidLedger::new();
        let rfq = RfqId::rand();
        let winner = pending(&rfq, &VehicleId::rand(), 450);
        let winner_id = winner.id.clone();
        let loser = pending(&rfq, &VehicleId::rand(), 500);
        let loser_id = loser.id.clone();
        let withdrawn = pending(&rfq, &VehicleId::rand(), 550);
        let withdrawn_id = withdrawn.id.clone();
        ledger.insert(winner).await.unwrap();
        ledger.insert(loser).await.unwrap();
        ledger.insert(withdrawn).await.unwrap();
        ledger
            .mark(&withdrawn_id, BidState::Pending, BidState::Withdrawn)
            .await
            .unwrap();
        ledger
            .mark(&winner_id, BidState::Pending, BidState::Awarded)
            .await
            .unwrap();

        let rejected = ledger.reject_losers(&rfq, &winner_id).await;
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, loser_id);
        assert_eq!(
            ledger.get(&withdrawn_id).await.unwrap().state,
            BidState::Withdrawn
        );
        assert_eq!(
            ledger.get(&winner_id).await.unwrap().state,
            BidState::Awarded
        );
    }

    #[tokio::test]
    async fn list_is_sorted_by_amount_then_time() {
        let ledger = BidLedger::new();
        let rfq = RfqId::rand();
        let expensive = pending(&rfq, &VehicleId::rand(), 900);
        let cheap = pending(&rfq, &VehicleId::rand(), 300);
        let middle = pending(&rfq, &VehicleId::rand(), 600);
        ledger.insert(expensive.clone()).await.unwrap();
        ledger.insert(cheap.clone()).await.unwrap();
        ledger.insert(middle.clone()).await.unwrap();

        let listed = ledger.list_for_rfq(&rfq).await;
        let ids: Vec<_> = listed.into_iter().map(|bid| bid.id).collect();
        assert_eq!(ids, vec![cheap.id, middle.id, expensive.id]);
    }
}
