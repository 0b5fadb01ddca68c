use crate::helpers::ApiError;
use crate::integrations::SessionLink;
use actix_web::{web, HttpResponse};
use shared_types::ApiEnvelope;
use std::sync::Arc;

pub async fn link(link: web::Data<Arc<dyn SessionLink>>) -> Result<HttpResponse, ApiError> {
    let status = link
        .request_link()
        .await
        .map_err(|e| ApiError::internal("Failed to start WhatsApp link", e))?;

    let message = if status.linked {
        "Already linked"
    } else if status.qr.is_some() {
        "Scan QR"
    } else {
        "Starting…"
    };

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(status).with_message(message)))
}

pub async fn status(link: web::Data<Arc<dyn SessionLink>>) -> Result<HttpResponse, ApiError> {
    let status = link
        .get_status()
        .await
        .map_err(|e| ApiError::internal("Failed to get WhatsApp status", e))?;

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(status)))
}

pub async fn unlink(link: web::Data<Arc<dyn SessionLink>>) -> Result<HttpResponse, ApiError> {
    let status = link
        .unlink()
        .await
        .map_err(|e| ApiError::internal("Failed to unlink WhatsApp", e))?;

    tracing::info!("WhatsApp session unlinked");

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(status).with_message("WhatsApp unlinked")))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{FakeLink, TestApp};
    use crate::integrations::SessionLink;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_link_status_unlink_flow() {
        let app = TestApp::new();
        let link: Arc<dyn SessionLink> = Arc::new(FakeLink::default());
        let service = init_test_service!(app, 1000, link);

        let req = test::TestRequest::get()
            .uri("/api/settings/whatsapp/status")
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;
        assert_eq!(
            body["data"],
            json!({ "linked": false, "status": "UNLINKED", "number": null, "qr": null })
        );

        let req = test::TestRequest::get()
            .uri("/api/settings/whatsapp/link")
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;
        assert_eq!(body["message"], "Scan QR");
        assert_eq!(body["data"]["status"], "PAIRING");
        assert_eq!(body["data"]["qr"], "data:image/png;base64,abc");

        let req = test::TestRequest::get()
            .uri("/api/settings/whatsapp/status")
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;
        assert_eq!(body["data"]["linked"], true);
        assert_eq!(body["data"]["qr"], Value::Null);

        let req = test::TestRequest::get()
            .uri("/api/settings/whatsapp/link")
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;
        assert_eq!(body["message"], "Already linked");

        let req = test::TestRequest::post()
            .uri("/api/settings/whatsapp/unlink")
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;
        assert_eq!(body["message"], "WhatsApp unlinked");
        assert_eq!(body["data"]["status"], "UNLINKED");
    }

    #[actix_web::test]
    async fn test_link_failure_envelope() {
        let app = TestApp::new();
        let link: Arc<dyn SessionLink> = Arc::new(FakeLink {
            fail: true,
            ..Default::default()
        });
        let service = init_test_service!(app, 1000, link);

        let req = test::TestRequest::get()
            .uri("/api/settings/whatsapp/link")
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to start WhatsApp link");
        assert_eq!(body["error"]["code"], 500);
    }
}
