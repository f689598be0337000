use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use helper::err::IndividualErrorList;
use model::view::notification::{AwardNotice, RejectionNotice};
use nutype::nutype;
use serde::Serialize;
use tracing::{debug, warn};

type HttpClient = reqwest_middleware::ClientWithMiddleware;

const DELIVERY_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

#[nutype(
    derive(Clone, Debug, Deserialize),
    validate(predicate = validate_http_url)
)]
pub struct NotifierUrl(String);

fn validate_http_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Downstream consumer of award/rejection events.
///
/// Delivery is best-effort: the award is the durable fact, so a failed
/// notice is logged and retried here, never surfaced to the triggering
/// call.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify_award(&self, notice: AwardNotice);
    async fn notify_rejections(&self, notices: Vec<RejectionNotice>);
}

/// Posts notices as JSON to `<endpoint>/award` and `<endpoint>/rejection`.
/// Without a configured endpoint it degrades to log-only.
pub struct WebhookNotifier {
    client:   Arc<HttpClient>,
    endpoint: Option<NotifierUrl>,
}

impl WebhookNotifier {
    pub fn new(client: Arc<HttpClient>, endpoint: Option<NotifierUrl>) -> Self {
        Self { client, endpoint }
    }

    async fn post<T>(&self, route: &str, payload: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let Some(endpoint) = &self.endpoint else {
            debug!("no notifier endpoint configured, dropping {} notice", route);
            return Ok(());
        };
        let url = format!(
            "{}/{}",
            endpoint.clone().into_inner().trim_end_matches('/'),
            route
        );

        let mut last_failure = anyhow!("no delivery attempt was made");
        for attempt in 1..=DELIVERY_ATTEMPTS {
            let sent = self
                .client
                .post(url.as_str())
                .json(payload)
                .send()
                .await
                .context("Failed to send the notice")
                .and_then(|response| {
                    response
                        .error_for_status()
                        .context("Notifier endpoint refused the notice")
                });
            match sent {
                Ok(_) => return Ok(()),
                Err(err) => {
                    debug!(
                        "notice delivery attempt {}/{} to {} failed: {:?}",
                        attempt, DELIVERY_ATTEMPTS, url, err
                    );
                    last_failure = err;
                }
            }
            if attempt < DELIVERY_ATTEMPTS {
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }
        Err(last_failure)
    }
}

#[async_trait]
impl EventNotifier for WebhookNotifier {
    async fn notify_award(&self, notice: AwardNotice) {
        if let Err(err) = self.post("award", &notice).await {
            warn!(
                "award notice for bid {} on RFQ {} undelivered: {:?}",
                notice.bid_id, notice.rfq_id, err
            );
        }
    }

    async fn notify_rejections(&self, notices: Vec<RejectionNotice>) {
        let mut failures = Vec::new();
        for notice in notices {
            if let Err(err) = self.post("rejection", &notice).await {
                failures.push(err.context(format!(
                    "rejection notice for bid {} undelivered",
                    notice.bid_id
                )));
            }
        }
        if !failures.is_empty() {
            let failures = IndividualErrorList::from(failures);
            warn!(
                "{} rejection notices undelivered: {}",
                failures.len(),
                failures
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_http() {
        assert!(NotifierUrl::try_new("http://notifier:9000").is_ok());
        assert!(
            NotifierUrl::try_new("https://notifier.example").is_ok()
        );
        assert!(NotifierUrl::try_new("notifier:9000").is_err());
    }
}
