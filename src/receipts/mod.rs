use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::order::{Order, OrderNumber};
use crate::utils::IsTransient;

mod text;

pub use text::TextReceiptGenerator;

// ============================================================================
// Receipts - Document Renderer Collaborator
// ============================================================================
//
// Rendering a receipt is an external concern. The order core hands a settled
// order to a `ReceiptGenerator` and stores whatever document comes back.
// Generators report whether a failure is worth retrying.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order_number: OrderNumber,
    /// Order version the receipt was rendered from
    pub order_version: i64,
    pub content_type: &'static str,
    pub body: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReceiptError {
    /// The renderer is temporarily unreachable
    #[error("Receipt renderer unavailable: {0}")]
    Unavailable(String),

    /// The renderer refused this order
    #[error("Receipt rejected: {0}")]
    Rejected(String),
}

impl IsTransient for ReceiptError {
    fn is_transient(&self) -> bool {
        matches!(self, ReceiptError::Unavailable(_))
    }
}

#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    async fn generate(&self, order: &Order) -> Result<Receipt, ReceiptError>;
}
