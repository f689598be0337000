use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::prom_metrics::EXPIRED_RFQS_COUNT;
use crate::repository::cron::Cron;
use crate::repository::rfq::RfqStore;

pub async fn init(cron: Arc<Cron>, rfqs: Arc<RfqStore>) -> Result<()> {
    cron.add_periodic(move || {
        let rfqs = rfqs.clone();
        Box::pin(sweep_expired(rfqs))
    })
    .await
    .context("Failed to add periodic task to expire overdue RFQs")?;

    Ok(())
}

/// Expire every open RFQ whose pickup time has elapsed. Losing the race to a
/// concurrent award attempt is fine; the sweep picks up stragglers on the
/// next tick.
async fn sweep_expired(rfqs: Arc<RfqStore>) {
    let expired = rfqs.expire_overdue(Utc::now());
    if !expired.is_empty() {
        EXPIRED_RFQS_COUNT
            .with_label_values(&[])
            .inc_by(expired.len() as f64);
        info!("expired {} overdue RFQs", expired.len());
    }
}
