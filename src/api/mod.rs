use actix_web::{error, web, HttpServer, App};
use std::net::IpAddr;

use crate::service::{OrderService, ServiceError};

mod errors;
mod handlers;
mod identity;

pub use errors::{ErrorBody, Unauthenticated};
pub use handlers::{AdvanceStatusRequest, ConfirmPaymentRequest, CreateOrderRequest, RejectPaymentRequest};
pub use identity::{caller_from_headers, USER_ID_HEADER, USER_ROLE_HEADER};

// ============================================================================
// HTTP API - Order Endpoints
// ============================================================================
//
// POST /orders                                   checkout
// GET  /orders?status=&payment_status=           list, newest first
// GET  /orders/{order_number}                    detail
// POST /orders/{order_number}/payment/confirm    staff: payment received
// POST /orders/{order_number}/payment/reject     staff: payment refused
// POST /orders/{order_number}/status             fulfillment transition
// GET  /orders/{order_number}/receipt            receipt document
// GET  /receipts/failed                          staff: dead-lettered receipt jobs
//
// ============================================================================

/// Register the order routes and the JSON/query error handlers
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            actix_web::ResponseError::error_response(&ServiceError::Validation {
                field: "body".to_string(),
                message,
            }),
        )
        .into()
    });

    let query = web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            actix_web::ResponseError::error_response(&ServiceError::Validation {
                field: "query".to_string(),
                message,
            }),
        )
        .into()
    });

    cfg.app_data(json)
        .app_data(query)
        .service(
            web::resource("/orders")
                .route(web::post().to(handlers::create_order))
                .route(web::get().to(handlers::list_orders)),
        )
        .route("/orders/{order_number}", web::get().to(handlers::get_order))
        .route("/orders/{order_number}/payment/confirm", web::post().to(handlers::confirm_payment))
        .route("/orders/{order_number}/payment/reject", web::post().to(handlers::reject_payment))
        .route("/orders/{order_number}/status", web::post().to(handlers::advance_status))
        .route("/orders/{order_number}/receipt", web::get().to(handlers::receipt))
        .route("/receipts/failed", web::get().to(handlers::failed_receipts));
}

/// Start the order API server
pub async fn start_api_server(service: web::Data<OrderService>, host: IpAddr, port: u16) -> std::io::Result<()> {
    tracing::info!("🍎 Starting order API on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
