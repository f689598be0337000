use serde::{Deserialize, Serialize};

use crate::TransporterId;

/// Transporter request to add a vehicle to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVehicle {
    pub transporter_id:      TransporterId,
    pub registration_number: String,
    #[serde(default)]
    pub model_name:          String,
    pub tonnage_kg:          u32,
}

/// Query selecting one transporter's fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetQuery {
    pub transporter_id: TransporterId,
}
