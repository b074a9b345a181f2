use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Caller Identity - Auth/Session Collaborator Interface
// ============================================================================
//
// Sessions are issued elsewhere. The order core receives an already
// authenticated caller and only decides what that caller's role may do.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Confirm or reject payments
    pub fn can_settle_payments(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }

    /// Move orders through fulfillment
    pub fn can_fulfill_orders(&self) -> bool {
        matches!(self, Role::Seller | Role::Staff | Role::Admin)
    }

    /// See every shopper's orders
    pub fn can_view_all_orders(&self) -> bool {
        !matches!(self, Role::Customer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn staff(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Staff)
    }

    pub fn seller(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Seller)
    }
}
