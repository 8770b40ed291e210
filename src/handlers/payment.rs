use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::BillingService;

#[utoipa::path(
    post,
    path = "/payment/subscription",
    tag = "payment",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription created", body = CreateSubscriptionResponse),
        (status = 400, description = "Invalid role or request"),
        (status = 402, description = "Payment gateway rejected the request"),
        (status = 409, description = "Trial or subscription still active"),
        (status = 503, description = "Payment gateway unavailable")
    )
)]
pub async fn create_subscription(
    billing_service: web::Data<BillingService>,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse> {
    match billing_service.subscribe(request.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payment/status/{user_id}",
    tag = "payment",
    params(
        ("user_id" = String, Path, description = "Subscriber id assigned by the identity provider")
    ),
    responses(
        (status = 200, description = "Billing status (trial granted on first query)", body = BillingStatusResponse),
        (status = 400, description = "Role not eligible for billing"),
        (status = 404, description = "Unknown subscriber")
    )
)]
pub async fn billing_status(
    billing_service: web::Data<BillingService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    match billing_service.billing_status(&user_id).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .route("/subscription", web::post().to(create_subscription))
            .route("/status/{user_id}", web::get().to(billing_status)),
    );
}
