use serde::{Deserialize, Serialize};

use crate::{BidId, TransporterId, VehicleId};

/// What the registry knows about one transporter-owned vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id:                  VehicleId,
    pub owner:               TransporterId,
    pub registration_number: String,
    pub model_name:          String,
    pub tonnage_kg:          u32,
    /// The awarded bid this vehicle is bound to, if any. A committed vehicle
    /// cannot back a new bid until the commitment clears.
    pub commitment:          Option<BidId>,
}

impl VehicleRecord {
    pub fn new(
        owner: TransporterId,
        registration_number: String,
        model_name: String,
        tonnage_kg: u32,
    ) -> Self {
        Self {
            id: VehicleId::rand(),
            owner,
            registration_number,
            model_name,
            tonnage_kg,
            commitment: None,
        }
    }
}
