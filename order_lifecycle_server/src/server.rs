use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_lifecycle_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    lease::{AnyLeaseStore, LeaseLock, MemoryLeaseStore},
    webhook::WebhookVerifier,
    OrderFlowApi,
    ShippingWebhookApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::ensure_database_dir,
    middleware::WebhookSignatureFactory,
    routes::{
        health,
        json_config,
        CancelOrderRoute,
        CreateOrderRoute,
        OrderByIdRoute,
        OrderHistoryRoute,
        PayOrderRoute,
        ShipOrderRoute,
        ShippingWebhookRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 64;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let leases = create_lease_store(&config).await?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    log_effective_config(&config, &leases);
    let srv = create_server_instance(config, db, leases, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    leases: AnyLeaseStore,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        // Every worker gets its own API objects, but they all share the one pool and the one lease store
        let lock = LeaseLock::new(leases.clone(), config.acquire_policy());
        let orders_api =
            OrderFlowApi::new(db.clone(), lock, config.processing_delay()).with_producers(producers.clone());
        let webhook_api = ShippingWebhookApi::new(db.clone()).with_producers(producers.clone());
        let verifier = WebhookVerifier::new(config.webhook.secret.clone());
        let webhook_scope = web::scope("/webhooks")
            .wrap(WebhookSignatureFactory::new(&config.webhook.signature_header, verifier, config.webhook.mode))
            .service(ShippingWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("olc::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::new(ServerOptions::from_config(&config)))
            .service(health)
            .service(CreateOrderRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(OrderHistoryRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(PayOrderRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(CancelOrderRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(ShipOrderRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(OrderByIdRoute::<SqliteDatabase, AnyLeaseStore>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

/// Connects to Redis if `OLC_REDIS_URL` is set, otherwise falls back to an in-process lease store.
pub async fn create_lease_store(config: &ServerConfig) -> Result<AnyLeaseStore, ServerError> {
    match config.redis_url.as_deref() {
        None => {
            warn!(
                "🔒️ OLC_REDIS_URL is not set. Leases are held in process memory, so they only protect orders within \
                 this one server instance."
            );
            Ok(AnyLeaseStore::Memory(MemoryLeaseStore::new()))
        },
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = order_lifecycle_engine::lease::RedisLeaseStore::connect(url)
                .await
                .map_err(|e| ServerError::InitializeError(format!("Could not connect to the Redis lease store. {e}")))?;
            Ok(AnyLeaseStore::Redis(store))
        },
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(ServerError::ConfigurationError(
            "OLC_REDIS_URL is set, but this server was built without the `redis` feature.".into(),
        )),
    }
}

fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_status_changed(|ev| {
            Box::pin(async move {
                debug!("📬️ Order {} went from {} to {} ({:?}): {}", ev.order_id, ev.from, ev.to, ev.source, ev.reason);
            })
        })
        .on_refund_requested(|ev| {
            Box::pin(async move {
                info!(
                    "📬️💸️ Refund requested for order {} (shipment {}, status {})",
                    ev.order_id, ev.shipment_id, ev.shipping_status
                );
            })
        });
    hooks
}

fn log_effective_config(config: &ServerConfig, leases: &AnyLeaseStore) {
    let policy = config.acquire_policy();
    info!(
        "🪛️ Lease store: {} | TTL: {:?} | attempts: {} every {:?} | max processing delay: {:?}",
        leases.name(),
        policy.ttl,
        policy.max_attempts,
        policy.retry_interval,
        config.max_processing_delay
    );
    if config.max_processing_delay >= policy.ttl {
        warn!(
            "🪛️ The maximum processing delay ({:?}) is not shorter than the lease TTL ({:?}). Concurrent transitions on \
             the same order can both be applied.",
            config.max_processing_delay, policy.ttl
        );
    }
    info!(
        "🪛️ Webhooks: {} signatures in the {} header (secret of {} bytes)",
        config.webhook.mode,
        config.webhook.signature_header,
        config.webhook.secret.reveal().len()
    );
    if config.webhook.uses_default_secret() {
        warn!("🚨️ The shipping webhook is using the default secret. Set OLC_WEBHOOK_SECRET.");
    }
    info!("🪛️ Request timeout for transitions: {:?}", config.request_timeout);
    let slowest = policy.worst_case_wait() + config.max_processing_delay;
    if config.request_timeout < slowest {
        warn!(
            "🪛️ A transition can take up to {slowest:?} (lock wait {:?} plus processing), longer than the request \
             timeout. Slow transitions will answer 504 and finish in the background.",
            policy.worst_case_wait()
        );
    }
}
