use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use model::dto::vehicle::VehicleRecord;
use model::{BidId, TransporterId, VehicleId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vehicle {0} is not registered")]
    NotFound(VehicleId),
    #[error("vehicle {vehicle} is already committed to bid {committed_to}")]
    AlreadyCommitted {
        vehicle:      VehicleId,
        committed_to: BidId,
    },
    #[error("registration number {0} is already in use")]
    DuplicateRegistration(String),
}

/// Availability state of the transporter fleet. The commitment field is the
/// only cross-RFQ shared mutable state in the system; `reserve` is its
/// single check-then-set serialization point.
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    vehicles:        DashMap<VehicleId, VehicleRecord>,
    by_registration: DashMap<String, VehicleId>,
}

impl VehicleRegistry {
    pub fn new() -> Self { Self::default() }

    /// The registration-number index entry is claimed first, so two
    /// concurrent registrations of the same plate cannot both succeed.
    pub fn register(&self, record: VehicleRecord) -> Result<(), Error> {
        match self.by_registration.entry(record.registration_number.clone())
        {
            Entry::Occupied(_) => Err(Error::DuplicateRegistration(
                record.registration_number.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(record.id.clone());
                self.vehicles.insert(record.id.clone(), record);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &VehicleId) -> Option<VehicleRecord> {
        self.vehicles.get(id).map(|entry| entry.value().clone())
    }

    pub fn owned_by(&self, owner: &TransporterId) -> Vec<VehicleRecord> {
        let mut fleet: Vec<VehicleRecord> = self
            .vehicles
            .iter()
            .filter(|entry| &entry.value().owner == owner)
            .map(|entry| entry.value().clone())
            .collect();
        fleet.sort_unstable_by(|a, b| {
            a.registration_number.cmp(&b.registration_number)
        });
        fleet
    }

    pub fn is_commitment_free(&self, id: &VehicleId) -> Result<bool, Error> {
        let entry = self
            .vehicles
            .get(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        Ok(entry.value().commitment.is_none())
    }

    /// Atomic check-then-set under one entry guard; of two RFQs racing to
    /// award the same vehicle, exactly one reservation lands.
    pub fn reserve(&self, id: &VehicleId, bid: &BidId) -> Result<(), Error> {
        let mut entry = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let record = entry.value_mut();
        match &record.commitment {
            Some(committed_to) => Err(Error::AlreadyCommitted {
                vehicle:      id.clone(),
                committed_to: committed_to.clone(),
            }),
            None => {
                record.commitment = Some(bid.clone());
                Ok(())
            }
        }
    }

    /// Clear the commitment. Releasing an already-free vehicle is a no-op.
    pub fn release(&self, id: &VehicleId) -> Result<(), Error> {
        let mut entry = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        entry.value_mut().commitment = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn truck(owner: &TransporterId, plate: &str) -> VehicleRecord {
        VehicleRecord::new(
            owner.clone(),
            plate.to_string(),
            "Tata LPT 1618".to_string(),
            16_000,
        )
    }

    #[test]
    fn reserve_then_reserve_conflicts() {
        let registry = VehicleRegistry::new();
        let owner = TransporterId::rand();
        let record = truck(&owner, "MH12AB1234");
        let id = record.id.clone();
        registry.register(record).unwrap();

        registry.reserve(&id, &BidId::rand()).unwrap();
        assert!(matches!(
            registry.reserve(&id, &BidId::rand()),
            Err(Error::AlreadyCommitted { .. })
        ));
        assert!(!registry.is_commitment_free(&id).unwrap());
    }

    #[test]
    fn release_frees_the_vehicle_and_is_idempotent() {
        let registry = VehicleRegistry::new();
        let owner = TransporterId::rand();
        let record = truck(&owner, "MH12AB1234");
        let id = record.id.clone();
        registry.register(record).unwrap();
        registry.reserve(&id, &BidId::rand()).unwrap();

        registry.release(&id).unwrap();
        registry.release(&id).unwrap();
        assert!(registry.is_commitment_free(&id).unwrap());
        assert!(registry.reserve(&id, &BidId::rand()).is_ok());
    }

    #[tokio::test]
    async fn concurrent_reservations_admit_exactly_one() {
        let registry = Arc::new(VehicleRegistry::new());
        let record = truck(&TransporterId::rand(), "MH12AB1234");
        let id = record.id.clone();
        registry.register(record).unwrap();

        let mut handles = vec![];
        for _ in 0..16 {
            let registry = registry.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                registry.reserve(&id, &BidId::rand()).is_ok()
            }));
        }
        let mut reserved = 0;
        for handle in handles {
            if handle.await.unwrap() {
                reserved += 1;
            }
        }
        assert_eq!(reserved, 1);
    }

    #[test]
    fn duplicate_registration_number_is_refused() {
        let registry = VehicleRegistry::new();
        let owner = TransporterId::rand();
        registry.register(truck(&owner, "MH12AB1234")).unwrap();
        assert!(matches!(
            registry.register(truck(&owner, "MH12AB1234")),
            Err(Error::DuplicateRegistration(_))
        ));
    }

    #[test]
    fn owned_by_filters_and_sorts_by_plate() {
        let registry = VehicleRegistry::new();
        let owner = TransporterId::rand();
        let other = TransporterId::rand();
        registry.register(truck(&owner, "MH12ZZ0002")).unwrap();
        registry.register(truck(&owner, "MH12AA0001")).unwrap();
        registry.register(truck(&other, "KA01BB0003")).unwrap();

        let fleet = registry.owned_by(&owner);
        let plates: Vec<_> = fleet
            .into_iter()
            .map(|record| record.registration_number)
            .collect();
        assert_eq!(plates, vec!["MH12AA0001", "MH12ZZ0002"]);
    }
}
