use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::SubscriptionStatus;
use crate::external::{GatewayPaymentMethod, GatewayStatus, PaymentMethodType, RemoteSubscription};
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::payment::create_subscription,
        handlers::payment::billing_status,
        handlers::webhook::mercadopago_webhook,
    ),
    components(
        schemas(
            UserRole,
            PaymentMethodDescriptor,
            CreateSubscriptionRequest,
            CreateSubscriptionResponse,
            BillingStatusResponse,
            SubscriptionStatus,
            RemoteSubscription,
            GatewayStatus,
            GatewayPaymentMethod,
            PaymentMethodType,
            WebhookNotification,
            WebhookNotificationData,
            ApiError,
        )
    ),
    tags(
        (name = "payment", description = "Subscription and billing-status API"),
        (name = "webhook", description = "Payment gateway notifications"),
    ),
    info(
        title = "Wise Expert Billing API",
        version = "1.0.0",
        description = "Subscription billing REST API for the Wise Expert sales platform",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
