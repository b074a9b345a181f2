use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::access::Caller;
use crate::domain::cart::{Cart, CartItem};
use crate::domain::order::{OrderFilter, OrderNumber, OrderStatus, PaymentMethod, ShippingAddress};
use crate::service::{OrderService, ServiceError};

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub transaction_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectPaymentRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

fn order_number(raw: &str) -> Result<OrderNumber, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::NotFound(format!("Order {} not found", raw)))
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_order(
    service: web::Data<OrderService>,
    caller: Caller,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    let cart = Cart::try_from_items(request.items)?;

    let order = service
        .create_order(&caller, cart, request.shipping_address, request.payment_method)
        .await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn list_orders(
    service: web::Data<OrderService>,
    caller: Caller,
    filter: web::Query<OrderFilter>,
) -> Result<HttpResponse, ServiceError> {
    let orders = service.list_orders(&caller, filter.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    service: web::Data<OrderService>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let order = service.get_order(&caller, order_number(&path)?).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn confirm_payment(
    service: web::Data<OrderService>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<ConfirmPaymentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let number = order_number(&path)?;
    let request = body.into_inner();

    let order = service
        .confirm_payment(&caller, number, request.transaction_id, request.notes)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn reject_payment(
    service: web::Data<OrderService>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<RejectPaymentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let number = order_number(&path)?;
    let order = service
        .reject_payment(&caller, number, body.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn advance_status(
    service: web::Data<OrderService>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<AdvanceStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let number = order_number(&path)?;
    let order = service
        .advance_order_status(&caller, number, body.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn receipt(
    service: web::Data<OrderService>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let receipt = service.receipt(&caller, order_number(&path)?).await?;
    Ok(HttpResponse::Ok()
        .content_type(receipt.content_type)
        .body(receipt.body))
}

pub async fn failed_receipts(
    service: web::Data<OrderService>,
    caller: Caller,
) -> Result<HttpResponse, ServiceError> {
    let failed = service.failed_receipts(&caller).await?;
    Ok(HttpResponse::Ok().json(failed))
}
