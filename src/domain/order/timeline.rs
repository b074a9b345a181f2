use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Timeline - Append-Only Audit Trail
// ============================================================================
//
// One entry per fulfillment or payment transition. Entries can only be
// pushed from inside the domain module and timestamps never go backwards.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Paid,
    Rejected,
}

impl From<OrderStatus> for TimelineStatus {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => TimelineStatus::Pending,
            OrderStatus::Confirmed => TimelineStatus::Confirmed,
            OrderStatus::Processing => TimelineStatus::Processing,
            OrderStatus::Shipped => TimelineStatus::Shipped,
            OrderStatus::Delivered => TimelineStatus::Delivered,
            OrderStatus::Cancelled => TimelineStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub status: TimelineStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Who caused the transition, if known
    pub actor: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline(Vec<TimelineEvent>);

impl Timeline {
    pub(crate) fn push(
        &mut self,
        status: TimelineStatus,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        actor: Option<Uuid>,
    ) {
        let timestamp = match self.0.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };

        self.0.push(TimelineEvent {
            status,
            message: message.into(),
            timestamp,
            actor,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEvent> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&TimelineEvent> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
