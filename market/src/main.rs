use std::env::var;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Data;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use helper::{env_load, env_load_opt, env_var};
#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
use nutype::nutype;
use reqwest_middleware::ClientBuilder;
use tracing::subscriber::set_global_default;
use tracing::{debug, info, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_forest::ForestLayer;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use crate::handler::*;
use crate::repository::notification::{NotifierUrl, WebhookNotifier};

mod controller;
mod handler;
mod prom_metrics;
mod repeated_tasks;
mod repository;
mod service;

env_var!(SERVER_PORT);
env_var!(NOTIFIER_URL);

#[nutype(derive(Clone, Copy, Debug), validate(greater = 0))]
pub struct ListenPort(u16);

/// Compose multiple layers into a `tracing`'s subscriber. The returned guard
/// must stay alive for the file appender to keep flushing.
pub fn get_subscriber(
    env_filter: String,
) -> (impl Subscriber + Send + Sync, WorkerGuard) {
    // Env variable LOG_CONFIG_PATH points at the path where
    // LOG_CONFIG_FILENAME is located
    let log_config_path =
        var("LOG_CONFIG_PATH").unwrap_or_else(|_| "./".to_string());
    // Env variable LOG_CONFIG_FILENAME names the log file
    let log_config_filename = var("LOG_CONFIG_FILENAME")
        .unwrap_or_else(|_| "marketplace.log".to_string());

    let file_appender =
        tracing_appender::rolling::never(log_config_path, log_config_filename);
    let (non_blocking_file, guard) =
        tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or(EnvFilter::new(env_filter));

    let reg = Registry::default()
        .with(env_filter)
        .with(fmt::Layer::default().with_writer(non_blocking_file));

    (reg.with(ForestLayer::default()), guard)
}

/// Register a subscriber as global default to process span data.
///
/// It should only be called once!
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (subscriber, _guard) = get_subscriber("info".into());
    init_subscriber(subscriber);

    debug!("Tracing initialized.");

    let port = env_load!(ListenPort, SERVER_PORT, u16);
    let sweep_period_seconds = var("EXPIRY_SWEEP_PERIOD_SECONDS")
        .unwrap_or_else(|_| "30".to_string())
        .parse::<u64>()
        .context("EXPIRY_SWEEP_PERIOD_SECONDS cannot be parsed as seconds")?;

    let http_client =
        Arc::new(ClientBuilder::new(reqwest::Client::new()).build());
    let notifier_endpoint = env_load_opt!(NotifierUrl, NOTIFIER_URL);
    if notifier_endpoint.is_none() {
        info!("NOTIFIER_URL not set, award notices will be log-only");
    }
    let notifier = Arc::new(WebhookNotifier::new(
        http_client,
        notifier_endpoint,
    ));

    let rfqs = Arc::new(repository::rfq::RfqStore::new());
    let bids = Arc::new(repository::bid::BidLedger::new());
    let vehicles = Arc::new(repository::vehicle::VehicleRegistry::new());

    // Services
    let rfq_life_service = Arc::new(service::rfq_life::RfqLife::new(
        rfqs.clone(),
        bids.clone(),
        vehicles.clone(),
    ));
    let fleet_service =
        Arc::new(service::fleet::Fleet::new(vehicles.clone()));
    let allocation_service = Arc::new(service::allocation::Allocation::new(
        rfqs.clone(),
        bids,
        vehicles,
        notifier,
    ));

    let cron = Arc::new(repository::cron::Cron::new(Duration::from_secs(
        sweep_period_seconds,
    )));
    repeated_tasks::init(cron, rfqs).await?;

    info!("Starting HTTP server on 0.0.0.0:{}", port.into_inner());

    let rfq_life_service = Data::from(rfq_life_service);
    let fleet_service = Data::from(fleet_service);
    let allocation_service = Data::from(allocation_service);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .app_data(Data::clone(&rfq_life_service))
            .app_data(Data::clone(&fleet_service))
            .app_data(Data::clone(&allocation_service))
            .service(
                web::scope("/api")
                    .route("/rfq", web::post().to(post_rfq))
                    .route("/rfq/{id}", web::get().to(get_rfq))
                    .route("/rfqs", web::get().to(get_rfqs))
                    .route("/rfq/{id}/cancel", web::post().to(post_cancel_rfq))
                    .route("/rfq/{id}/award", web::post().to(post_award_rfq))
                    .route(
                        "/rfq/{id}/delivered",
                        web::post().to(post_rfq_delivered),
                    )
                    .route("/rfq/{id}/bids", web::get().to(get_bids))
                    .route("/bid", web::post().to(post_bid))
                    .route(
                        "/bid/{id}/withdraw",
                        web::post().to(post_withdraw_bid),
                    )
                    .route("/vehicle", web::post().to(post_vehicle))
                    .route("/vehicles", web::get().to(get_vehicles))
                    .route("/health", web::get().to(health)),
            )
    })
    .bind(("0.0.0.0", port.into_inner()))?
    .run()
    .await?;

    Ok(())
}
