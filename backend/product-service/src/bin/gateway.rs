use actix_middleware::{HttpAuthMiddleware, Logging};
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use product_service::grpc::GrpcProductClient;
use product_service::services::ProductApi;
use product_service::telemetry::{init_tracing, shutdown_signal};
use product_service::{handlers, Config};
use std::sync::Arc;

/// Product HTTP Gateway
///
/// Exposes the product HTTP API and forwards every operation to a
/// product-service gRPC endpoint (`PRODUCT_GRPC_UPSTREAM`). Callers are
/// authenticated at the edge with `HTTP_AUTH_MODE`; the resolved identity is
/// forwarded upstream with `GRPC_CLIENT_AUTH_MODE`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.json_logs);

    tracing::info!("Starting product-gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let http_auth = config
        .auth_service(config.auth_modes.http)
        .map_err(|e| anyhow!(e))
        .context("HTTP auth setup failed")?;
    let client_auth = config
        .auth_service(config.auth_modes.grpc_client)
        .map_err(|e| anyhow!(e))
        .context("gRPC client auth setup failed")?;

    let client = GrpcProductClient::connect_lazy(&config.grpc_upstream, client_auth)
        .context("gRPC client setup failed")?;
    tracing::info!(upstream = %config.grpc_upstream, "Forwarding product calls over gRPC");

    let api: Arc<dyn ProductApi> = Arc::new(client);
    let api_data = web::Data::new(api);

    let http_bind_address = config.http_bind_address();
    tracing::info!(auth = http_auth.kind(), "Starting HTTP server at {}", http_bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(api_data.clone())
            .wrap(HttpAuthMiddleware::new(http_auth.clone()))
            .wrap(Logging)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&http_bind_address)
    .with_context(|| format!("failed to bind HTTP server to {http_bind_address}"))?
    .run();

    let server_handle = server.handle();

    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("Product-gateway shutting down");
    Ok(())
}
