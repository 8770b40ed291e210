use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use wise_billing_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{MercadoPagoService, PaymentGateway},
    handlers,
    middlewares::create_cors,
    services::{
        BillingService, DbSubscriberDirectory, DbSubscriptionRecordStore, SubscriberDirectory,
        SubscriptionRecordStore, WebhookService,
    },
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(MercadoPagoService::new(config.mercadopago.clone()));
    let store: Arc<dyn SubscriptionRecordStore> =
        Arc::new(DbSubscriptionRecordStore::new(pool.clone()));
    let directory: Arc<dyn SubscriberDirectory> =
        Arc::new(DbSubscriberDirectory::new(pool.clone()));

    let billing_service = BillingService::new(store, directory, gateway.clone());
    let webhook_service = WebhookService::new(billing_service.clone(), gateway);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(billing_service.clone()))
            .app_data(web::Data::new(webhook_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(web::scope("/api/v1").configure(handlers::payment_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
