/// HTTP handlers for product endpoints
///
/// Handlers read the caller through the `Caller` extractor, which is only
/// populated when `HttpAuthMiddleware` wraps the app.
pub mod health;
pub mod products;

use actix_web::web;

// Re-export handler functions at module level
pub use health::health_check;
pub use products::{create_product, delete_product, get_product, list_products, update_product};

/// Register product and health routes
///
/// The app must provide `web::Data<Arc<dyn ProductApi>>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/products")
                    .service(
                        web::resource("")
                            .route(web::get().to(list_products))
                            .route(web::post().to(create_product)),
                    )
                    .service(
                        web::resource("/{product_id}")
                            .route(web::get().to(get_product))
                            .route(web::patch().to(update_product))
                            .route(web::delete().to(delete_product)),
                    ),
            ),
    );
}
