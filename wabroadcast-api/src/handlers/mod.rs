/// Builds a test service over a `TestApp` with the given import limit and
/// session link.
#[cfg(test)]
macro_rules! init_test_service {
    ($app:expr, $limit:expr, $link:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($app.db.clone()))
                .app_data(actix_web::web::Data::new($crate::handlers::ImportSettings {
                    limit: $limit,
                }))
                .app_data(actix_web::web::Data::new($link))
                .configure($crate::handlers::configure),
        )
        .await
    };
}

pub mod categories;
pub mod contacts;
pub mod whatsapp;

use crate::database::Database;
use crate::helpers::ApiError;
use actix_web::{get, web, HttpResponse, Responder};
use std::sync::Arc;

/// Import limits shared by the bulk and preview endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ImportSettings {
    pub limit: usize,
}

#[get("/health")]
async fn health(db: web::Data<Arc<Database>>) -> impl Responder {
    if db.ping().await {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        }))
    } else {
        HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        }))
    }
}

/// Registers every route. Expects `Arc<Database>`, `ImportSettings` and
/// `Arc<dyn SessionLink>` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::bad_request("INVALID_PAYLOAD", "Invalid request body")
            .with_details(err.to_string())
            .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::bad_request("INVALID_QUERY", "Invalid query parameters")
            .with_details(err.to_string())
            .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::bad_request("INVALID_ID", "Invalid id")
            .with_details(err.to_string())
            .into()
    }))
    .service(health)
    .route("/api/contact", web::get().to(contacts::list_contacts))
    .route("/api/contact/add", web::post().to(contacts::add_contact))
    .route("/api/contact/bulk-add", web::post().to(contacts::bulk_add_contacts))
    .route("/api/contact/import/preview", web::post().to(contacts::preview_import))
    .route("/api/contact/update/{id}", web::put().to(contacts::update_contact))
    .route("/api/contact/delete/{id}", web::delete().to(contacts::delete_contact))
    .route("/api/category", web::get().to(categories::list_categories))
    .route("/api/category/add", web::post().to(categories::create_category))
    .route("/api/category/update/{id}", web::put().to(categories::update_category))
    .route("/api/category/delete/{id}", web::delete().to(categories::delete_category))
    .route("/api/settings/whatsapp/link", web::get().to(whatsapp::link))
    .route("/api/settings/whatsapp/status", web::get().to(whatsapp::status))
    .route("/api/settings/whatsapp/unlink", web::post().to(whatsapp::unlink));
}
