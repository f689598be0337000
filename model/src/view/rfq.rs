use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ContractorId;

/// Contractor request to open a new RFQ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRfq {
    pub contractor_id: ContractorId,
    pub source:        String,
    pub destination:   String,
    pub description:   String,
    pub pickup_at:     DateTime<Utc>,
}

/// Caller identity for owner-gated RFQ transitions (cancel, award,
/// delivered). Identity is always supplied explicitly; there is no ambient
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqAction {
    pub contractor_id: ContractorId,
}
