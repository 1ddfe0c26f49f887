/// Product handlers - HTTP endpoints for product operations
use crate::error::Result;
use crate::models::{CreateRequest, FindRequest, PriceRange, UpdateRequest, DEFAULT_LIMIT};
use crate::services::ProductApi;
use actix_middleware::Caller;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

/// Shared product backend, local or remote
pub type ProductApiData = web::Data<Arc<dyn ProductApi>>;

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub price_from: Option<i64>,
    pub price_to: Option<i64>,
    pub seller: Option<String>,
}

impl From<ListProductsQuery> for FindRequest {
    fn from(query: ListProductsQuery) -> Self {
        let price_range = PriceRange {
            from: query.price_from,
            to: query.price_to,
        };
        FindRequest {
            offset: query.offset.unwrap_or(0),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
            name: query.name,
            price_range: (!price_range.is_unbounded()).then_some(price_range),
            seller: query.seller,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
}

/// List products
pub async fn list_products(
    api: ProductApiData,
    caller: Caller,
    query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse> {
    let products = api.find(&caller.0, query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(products))
}

/// Get a product by ID
pub async fn get_product(
    api: ProductApiData,
    caller: Caller,
    product_id: web::Path<String>,
) -> Result<HttpResponse> {
    let product = api.find_one(&caller.0, &product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// Create a new product owned by the caller
pub async fn create_product(
    api: ProductApiData,
    caller: Caller,
    req: web::Json<CreateRequest>,
) -> Result<HttpResponse> {
    let product = api.create(&caller.0, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Update name and/or price of a product
pub async fn update_product(
    api: ProductApiData,
    caller: Caller,
    product_id: web::Path<String>,
    req: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let request = UpdateRequest {
        id: product_id.into_inner(),
        name: req.name,
        price: req.price,
    };
    let product = api.update(&caller.0, request).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// Delete a product, returning the removed record
pub async fn delete_product(
    api: ProductApiData,
    caller: Caller,
    product_id: web::Path<String>,
) -> Result<HttpResponse> {
    let product = api.delete(&caller.0, &product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryProductStorage;
    use crate::handlers;
    use crate::models::Product;
    use crate::services::ProductService;
    use actix_middleware::HttpAuthMiddleware;
    use actix_web::{http::StatusCode, test, App};
    use auth_core::TrustAuthService;
    use serde_json::json;

    fn seeded_api() -> Arc<dyn ProductApi> {
        Arc::new(ProductService::new(MemoryProductStorage::with_products(vec![
            Product {
                id: "p1".to_string(),
                name: "lamp".to_string(),
                price: 100,
                seller: "A".to_string(),
            },
            Product {
                id: "p2".to_string(),
                name: "desk".to_string(),
                price: 500,
                seller: "B".to_string(),
            },
        ])))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(seeded_api()))
                    .wrap(HttpAuthMiddleware::new(Arc::new(TrustAuthService::new())))
                    .configure(handlers::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_anonymous_list_and_get() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/v1/products?limit=1&offset=1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["id"], "p2");

        let req = test::TestRequest::get()
            .uri("/api/v1/products/p1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["seller"], "A");
    }

    #[actix_web::test]
    async fn test_list_filters_and_validation() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/v1/products?price_from=200&seller=B")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([{"id": "p2", "name": "desk", "price": 500, "seller": "B"}]));

        let req = test::TestRequest::get()
            .uri("/api/v1/products?limit=101")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_create_ignores_body_seller() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/products")
            .insert_header(("Authorization", "Bearer A"))
            .set_json(json!({"name": "chair", "price": 300, "seller": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["seller"], "A");
        assert_eq!(body["name"], "chair");
    }

    #[actix_web::test]
    async fn test_anonymous_create_is_unauthorized() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/products")
            .set_json(json!({"name": "chair", "price": 300}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "identity required", "status": 401}));
    }

    #[actix_web::test]
    async fn test_mutation_status_codes() {
        let app = app!();

        let req = test::TestRequest::patch()
            .uri("/api/v1/products/p1")
            .insert_header(("Authorization", "Bearer B"))
            .set_json(json!({"price": 1}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        let req = test::TestRequest::delete()
            .uri("/api/v1/products/missing")
            .insert_header(("Authorization", "Bearer B"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::patch()
            .uri("/api/v1/products/p1")
            .insert_header(("Authorization", "Bearer A"))
            .set_json(json!({"price": 150}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["price"], 150);
        assert_eq!(body["name"], "lamp");

        let req = test::TestRequest::delete()
            .uri("/api/v1/products/p1")
            .insert_header(("Authorization", "Bearer A"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], "p1");

        let req = test::TestRequest::get()
            .uri("/api/v1/products/p1")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn test_without_auth_middleware_mutations_fail_internally() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(seeded_api()))
                .configure(handlers::configure),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/api/v1/products/p1")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
