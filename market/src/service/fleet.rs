use std::sync::Arc;

use model::dto::vehicle::VehicleRecord;
use model::view::vehicle::PostVehicle;
use model::TransporterId;
use tracing::trace;

use crate::repository::vehicle::VehicleRegistry;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Registry(#[from] crate::repository::vehicle::Error),
}

/// Fleet intake for the vehicle registry: transporters add vehicles here
/// before they can back bids.
pub struct Fleet {
    vehicles: Arc<VehicleRegistry>,
}

impl Fleet {
    pub fn new(vehicles: Arc<VehicleRegistry>) -> Self { Self { vehicles } }

    pub async fn register(
        &self,
        request: PostVehicle,
    ) -> Result<VehicleRecord, Error> {
        trace!("registering vehicle: {:?}", request);

        if request.registration_number.trim().is_empty() {
            return Err(Error::MissingField("registrationNumber"));
        }

        let record = VehicleRecord::new(
            request.transporter_id,
            request.registration_number,
            request.model_name,
            request.tonnage_kg,
        );
        self.vehicles.register(record.clone())?;
        Ok(record)
    }

    pub async fn owned_by(
        &self,
        transporter: &TransporterId,
    ) -> Vec<VehicleRecord> {
        self.vehicles.owned_by(transporter)
    }
}
