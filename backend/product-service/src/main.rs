use actix_middleware::{HttpAuthMiddleware, Logging};
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use product_service::db::MemoryProductStorage;
use product_service::services::{ProductApi, ProductService};
use product_service::telemetry::{init_tracing, shutdown_signal};
use product_service::{handlers, Config};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Product Service
///
/// Serves the product API over HTTP and gRPC from one process, sharing one
/// product backend between both transports.
///
/// # Routes
///
/// - `/api/v1/products` - List and create products
/// - `/api/v1/products/{id}` - Read, update, delete a product
/// - `/api/v1/health` - Service status
///
/// gRPC: `market.product.v1.ProductService` plus `grpc.health.v1.Health`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.json_logs);

    tracing::info!("Starting product-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let http_auth = config
        .auth_service(config.auth_modes.http)
        .map_err(|e| anyhow!(e))
        .context("HTTP auth setup failed")?;
    let grpc_auth = config
        .auth_service(config.auth_modes.grpc)
        .map_err(|e| anyhow!(e))
        .context("gRPC auth setup failed")?;

    let api: Arc<dyn ProductApi> = Arc::new(ProductService::new(MemoryProductStorage::new()));
    let api_data = web::Data::new(api.clone());

    let http_bind_address = config.http_bind_address();
    let grpc_bind_address = config.grpc_bind_address();

    tracing::info!(auth = http_auth.kind(), "Starting HTTP server at {}", http_bind_address);

    // Create HTTP server
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

    let grpc_listener = TcpListener::bind(&grpc_bind_address)
        .await
        .with_context(|| format!("failed to bind gRPC server to {grpc_bind_address}"))?;

    let server_handle = server.handle();

    let (shutdown_tx, _) = broadcast::channel(1);
    let grpc_shutdown = shutdown_tx.subscribe();

    // Spawn both HTTP and gRPC servers concurrently
    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    // HTTP server task
    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await.context("HTTP server failed")
    });

    // gRPC server task
    tasks.spawn(async move {
        tracing::info!("gRPC server is running");
        product_service::grpc::start_grpc_server(grpc_listener, api, grpc_auth, grpc_shutdown)
            .await
            .map_err(|e| anyhow!("gRPC server failed: {e}"))
    });

    let mut first_error: Option<anyhow::Error> = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(_))) => {
                        tracing::info!("Server task completed");
                    }
                    Some(Ok(Err(e))) => {
                        tracing::error!("Task returned error: {:#}", e);
                        first_error.get_or_insert(e);
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Task join error: {}", e);
                        first_error.get_or_insert_with(|| anyhow!("task join error: {e}"));
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(());
                server_handle.stop(true).await;
                // Let the gRPC server drain in-flight calls
                while let Some(result) = tasks.join_next().await {
                    if let Ok(Err(e)) = result {
                        tracing::error!("Task returned error during shutdown: {:#}", e);
                        first_error.get_or_insert(e);
                    }
                }
                break;
            }
        }
    }

    tracing::info!("Product-service shutting down");

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
