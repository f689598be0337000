use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use futures::Future;

/// Schedules background work on the tokio runtime.
pub struct Cron {
    periodic_task_period: Duration,
}

impl Cron {
    pub fn new(periodic_task_period: Duration) -> Self {
        Self { periodic_task_period }
    }

    /// Add a job to be executed at the period configured at the creation of
    /// the instance. Each firing runs as its own task, so a slow run never
    /// delays the next tick.
    pub async fn add_periodic<T>(&self, callback: T) -> Result<()>
    where
        T: 'static,
        T: Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
    {
        let mut interval = tokio::time::interval(self.periodic_task_period);

        tokio::spawn(async move {
            loop {
                interval.tick().await;
                tokio::spawn(callback());
            }
        });
        Ok(())
    }
}
