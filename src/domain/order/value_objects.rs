use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::cart::{CartItem, ProductId};
use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Globally unique order number, assigned once when the order is placed.
///
/// Backed by a time-ordered UUIDv7 which is also the id of the order's event
/// stream. Displayed as `FM-<32 upper hex>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OrderNumber(Uuid);

const ORDER_NUMBER_PREFIX: &str = "FM-";

impl OrderNumber {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ORDER_NUMBER_PREFIX, self.0.simple().to_string().to_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid order number: {0}")]
pub struct InvalidOrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw = match trimmed.get(..ORDER_NUMBER_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(ORDER_NUMBER_PREFIX) => &trimmed[ORDER_NUMBER_PREFIX.len()..],
            _ => trimmed,
        };
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| InvalidOrderNumber(s.to_string()))
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.to_string()
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = InvalidOrderNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where and to whom an order is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub area: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl ShippingAddress {
    /// Trimmed copy of the address, or the name of the first blank
    /// required field.
    pub fn normalized(&self) -> Result<Self, &'static str> {
        let required = [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("address_line", &self.address_line),
            ("city", &self.city),
            ("area", &self.area),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(*field);
        }

        Ok(Self {
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address_line: self.address_line.trim().to_string(),
            city: self.city.trim().to_string(),
            area: self.area.trim().to_string(),
            instructions: non_blank(self.instructions.as_deref()),
        })
    }
}

/// Trim an optional free-text field, folding blank input into `None`
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    /// Mobile wallet, paid to the merchant number and confirmed by staff
    Bkash,
    /// Mobile wallet, paid to the merchant number and confirmed by staff
    Nagad,
    Card,
}

impl PaymentMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::Bkash => "bKash",
            PaymentMethod::Nagad => "Nagad",
            PaymentMethod::Card => "Card",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Rejected => "rejected",
        }
    }

    /// pending → paid | rejected; both outcomes are terminal
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid) | (PaymentStatus::Pending, PaymentStatus::Rejected)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    /// Staff member who confirmed or rejected the payment
    pub settled_by: Option<Uuid>,
}

impl PaymentInfo {
    pub fn submitted(method: PaymentMethod, submitted_at: DateTime<Utc>) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            notes: None,
            paid_at: None,
            submitted_at,
            settled_by: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Fulfillment adjacency. Delivered and cancelled have no way out.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing | Shipped, Cancelled)
        )
    }

    /// Timeline message recorded when an order enters this status
    pub fn timeline_message(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order placed",
            OrderStatus::Confirmed => "Order confirmed",
            OrderStatus::Processing => "Order is being prepared",
            OrderStatus::Shipped => "Order shipped",
            OrderStatus::Delivered => "Order delivered",
            OrderStatus::Cancelled => "Order cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

/// A cart line frozen at order time, together with the product's display
/// data as it was then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub name_bn: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub weight: String,
    pub image: Option<String>,
    pub line_total: Decimal,
}

impl TryFrom<&CartItem> for OrderItem {
    type Error = OrderError;

    /// Freeze a cart line, rejecting quantities and prices no order may carry
    fn try_from(item: &CartItem) -> Result<Self, OrderError> {
        if item.quantity < 1 {
            return Err(OrderError::InvalidItemQuantity {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(OrderError::InvalidItemPrice {
                product_id: item.product_id.clone(),
                unit_price: item.unit_price,
            });
        }
        let line_total = item.line_total().ok_or(OrderError::AmountOverflow)?;

        Ok(Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            name_bn: item.name_bn.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            weight: item.weight.clone(),
            image: item.image.clone(),
            line_total,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "  Rahim Uddin ".to_string(),
            phone: "01711000000".to_string(),
            address_line: "House 12, Road 5".to_string(),
            city: "Dhaka".to_string(),
            area: "Dhanmondi".to_string(),
            instructions: Some("   ".to_string()),
        }
    }

    #[test]
    fn test_order_number_round_trips_through_display() {
        let number = OrderNumber::generate();
        let shown = number.to_string();
        assert!(shown.starts_with("FM-"));
        assert_eq!(shown.parse::<OrderNumber>().unwrap(), number);
        assert_eq!(number.as_uuid().to_string().parse::<OrderNumber>().unwrap(), number);
        assert!("FM-not-a-number".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn test_order_numbers_are_unique() {
        let numbers: std::collections::HashSet<_> = (0..1000).map(|_| OrderNumber::generate()).collect();
        assert_eq!(numbers.len(), 1000);
    }

    #[test]
    fn test_address_normalization_trims_and_drops_blank_instructions() {
        let normalized = address().normalized().unwrap();
        assert_eq!(normalized.full_name, "Rahim Uddin");
        assert_eq!(normalized.instructions, None);
    }

    #[test]
    fn test_address_reports_first_blank_field() {
        let mut addr = address();
        addr.city = " ".to_string();
        addr.area = String::new();
        assert_eq!(addr.normalized(), Err("city"));
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Rejected));
        for from in [Paid, Rejected] {
            for to in [Pending, Paid, Rejected] {
                assert!(!from.can_transition_to(to), "{} -> {} must be refused", from, to);
            }
        }
    }

    #[test]
    fn test_order_status_adjacency() {
        use OrderStatus::*;
        let next = |from: OrderStatus| -> Vec<OrderStatus> {
            OrderStatus::ALL.into_iter().filter(|to| from.can_transition_to(*to)).collect()
        };
        assert_eq!(next(Pending), vec![Confirmed, Cancelled]);
        assert_eq!(next(Confirmed), vec![Processing, Cancelled]);
        assert_eq!(next(Processing), vec![Shipped, Cancelled]);
        assert_eq!(next(Shipped), vec![Delivered, Cancelled]);
        assert!(next(Delivered).is_empty());
        assert!(next(Cancelled).is_empty());
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_status_strings_are_closed() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"refunded\"").is_err());
        assert_eq!(serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(), "\"cash_on_delivery\"");
    }
}
