use chrono::{DateTime, Utc};
use dashmap::DashMap;
use model::domain::rfq::{Rfq, RfqState};
use model::{BidId, RfqId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("RFQ {0} does not exist")]
    NotFound(RfqId),
    #[error("RFQ {id} is {actual}, expected {expected}")]
    InvalidState {
        id:       RfqId,
        expected: RfqState,
        actual:   RfqState,
    },
}

/// Authoritative store of RFQ records. Every state change is a
/// compare-and-swap under one entry guard, the in-memory equivalent of a
/// single-row conditional update: of N concurrent callers racing the same
/// transition, exactly one observes `Ok`.
#[derive(Debug, Default)]
pub struct RfqStore {
    database: DashMap<RfqId, Rfq>,
}

impl RfqStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, rfq: Rfq) {
        self.database.insert(rfq.id.clone(), rfq);
    }

    pub fn get(&self, id: &RfqId) -> Option<Rfq> {
        self.database.get(id).map(|entry| entry.value().clone())
    }

    /// Every RFQ, newest first.
    pub fn list(&self) -> Vec<Rfq> {
        let mut rfqs: Vec<Rfq> = self
            .database
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rfqs.sort_unstable_by(|a, b| b.created_at.cmp(&a.created_at));
        rfqs
    }

    fn transition(
        &self,
        id: &RfqId,
        expected: RfqState,
        next: RfqState,
    ) -> Result<Rfq, Error> {
        let mut entry = self
            .database
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let rfq = entry.value_mut();
        if rfq.state != expected {
            return Err(Error::InvalidState {
                id:       id.clone(),
                expected,
                actual:   rfq.state,
            });
        }
        rfq.state = next;
        Ok(rfq.clone())
    }

    /// The mutual-exclusion gate for awards: only one concurrent caller per
    /// RFQ wins `open -> awarding`.
    pub fn begin_award(&self, id: &RfqId) -> Result<Rfq, Error> {
        self.transition(id, RfqState::Open, RfqState::Awarding)
    }

    pub fn commit_award(
        &self,
        id: &RfqId,
        winning_bid: BidId,
    ) -> Result<Rfq, Error> {
        let mut entry = self
            .database
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let rfq = entry.value_mut();
        if rfq.state != RfqState::Awarding {
            return Err(Error::InvalidState {
                id:       id.clone(),
                expected: RfqState::Awarding,
                actual:   rfq.state,
            });
        }
        rfq.state = RfqState::Awarded;
        rfq.winning_bid = Some(winning_bid);
        Ok(rfq.clone())
    }

    /// Reopen after a failed award attempt so the contractor can retry.
    pub fn abort_award(&self, id: &RfqId) -> Result<Rfq, Error> {
        self.transition(id, RfqState::Awarding, RfqState::Open)
    }

    pub fn cancel(&self, id: &RfqId) -> Result<Rfq, Error> {
        self.transition(id, RfqState::Open, RfqState::Cancelled)
    }

    pub fn close(&self, id: &RfqId) -> Result<Rfq, Error> {
        self.transition(id, RfqState::Awarded, RfqState::Closed)
    }

    /// Flip every open RFQ whose pickup time has elapsed. Idempotent, and
    /// safe against a concurrent award: an RFQ that reached `awarding`
    /// between the scan and the swap is left alone.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Vec<RfqId> {
        let overdue: Vec<RfqId> = self
            .database
            .iter()
            .filter(|entry| {
                entry.value().state == RfqState::Open
                    && entry.value().pickup_at <= now
            })
            .map(|entry| entry.key().clone())
            .collect();

        overdue
            .into_iter()
            .filter(|id| {
                self.transition(id, RfqState::Open, RfqState::Expired).is_ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use model::ContractorId;

    use super::*;

    fn open_rfq(pickup_in: Duration) -> Rfq {
        let now = Utc::now();
        Rfq {
            id:          RfqId::rand(),
            contractor:  ContractorId::rand(),
            source:      "Mumbai".into(),
            destination: "Pune".into(),
            description: "40 crates of machine parts".into(),
            pickup_at:   now + pickup_in,
            created_at:  now,
            state:       RfqState::Open,
            winning_bid: None,
        }
    }

    #[test]
    fn begin_award_is_a_one_winner_gate() {
        let store = RfqStore::new();
        let rfq = open_rfq(Duration::hours(2));
        let id = rfq.id.clone();
        store.insert(rfq);

        assert!(store.begin_award(&id).is_ok());
        assert!(matches!(
            store.begin_award(&id),
            Err(Error::InvalidState { actual: RfqState::Awarding, .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_award_attempts_admit_exactly_one() {
        let store = Arc::new(RfqStore::new());
        let rfq = open_rfq(Duration::hours(2));
        let id = rfq.id.clone();
        store.insert(rfq);

        let mut handles = vec![];
        for _ in 0..16 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.begin_award(&id).is_ok()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[test]
    fn commit_records_the_winning_bid() {
        let store = RfqStore::new();
        let rfq = open_rfq(Duration::hours(2));
        let id = rfq.id.clone();
        store.insert(rfq);
        store.begin_award(&id).unwrap();

        let winner = BidId::rand();
        let awarded = store.commit_award(&id, winner.clone()).unwrap();
        assert_eq!(awarded.state, RfqState::Awarded);
        assert_eq!(awarded.winning_bid, Some(winner));
    }

    #[test]
    fn abort_reopens_for_retry() {
        let store = RfqStore::new();
        let rfq = open_rfq(Duration::hours(2));
        let id = rfq.id.clone();
        store.insert(rfq);

        store.begin_award(&id).unwrap();
        store.abort_award(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().state, RfqState::Open);
        assert!(store.begin_award(&id).is_ok());
    }

    #[test]
    fn expiry_is_idempotent_and_spares_awarding_rfqs() {
        let store = RfqStore::new();
        let overdue = open_rfq(Duration::hours(-1));
        let overdue_id = overdue.id.clone();
        let guarded = open_rfq(Duration::hours(-1));
        let guarded_id = guarded.id.clone();
        let fresh = open_rfq(Duration::hours(3));
        let fresh_id = fresh.id.clone();
        store.insert(overdue);
        store.insert(guarded);
        store.insert(fresh);
        store.begin_award(&guarded_id).unwrap();

        let expired = store.expire_overdue(Utc::now());
        assert_eq!(expired, vec![overdue_id.clone()]);
        assert_eq!(store.get(&guarded_id).unwrap().state, RfqState::Awarding);
        assert_eq!(store.get(&fresh_id).unwrap().state, RfqState::Open);

        assert!(store.expire_overdue(Utc::now()).is_empty());
        assert_eq!(store.get(&overdue_id).unwrap().state, RfqState::Expired);
    }

    #[test]
    fn cancel_requires_open() {
        let store = RfqStore::new();
        let rfq = open_rfq(Duration::hours(2));
        let id = rfq.id.clone();
        store.insert(rfq);

        store.begin_award(&id).unwrap();
        store.commit_award(&id, BidId::rand()).unwrap();
        assert!(matches!(
            store.cancel(&id),
            Err(Error::InvalidState { actual: RfqState::Awarded, .. })
        ));
    }
}
