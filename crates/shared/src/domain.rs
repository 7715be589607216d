use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(OrderItemId);
id_newtype!(CommentId);
id_newtype!(AttachmentId);
id_newtype!(StatusUpdateId);

/// Production lifecycle of a supplier order. The remote store is the source
/// of truth; a record with no status is treated as `pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    #[default]
    Pending,
    Confirmed,
    InProduction,
    ReadyToShip,
    Shipped,
    Delivered,
    Cancelled,
}

impl ProductionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProduction => "in_production",
            Self::ReadyToShip => "ready_to_ship",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgente,
    Alta,
    Media,
    Bassa,
}

/// One of the four visual columns of the status board.
///
/// `confirmed` and `in_production` collapse into the same column; `shipped`
/// and `cancelled` map to no column and are not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    Pending,
    InProduction,
    ReadyToShip,
    Delivered,
}

impl BucketKey {
    /// Column order as rendered left to right.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProduction,
        Self::ReadyToShip,
        Self::Delivered,
    ];

    /// Resolves a raw key as delivered by a drag-and-drop layer. Unknown keys
    /// resolve to `None` and the drop is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "in_production" => Some(Self::InProduction),
            "ready_to_ship" => Some(Self::ReadyToShip),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProduction => "in_production",
            Self::ReadyToShip => "ready_to_ship",
            Self::Delivered => "delivered",
        }
    }

    pub fn for_status(status: ProductionStatus) -> Option<Self> {
        match status {
            ProductionStatus::Pending => Some(Self::Pending),
            ProductionStatus::Confirmed | ProductionStatus::InProduction => {
                Some(Self::InProduction)
            }
            ProductionStatus::ReadyToShip => Some(Self::ReadyToShip),
            ProductionStatus::Delivered => Some(Self::Delivered),
            ProductionStatus::Shipped | ProductionStatus::Cancelled => None,
        }
    }

    /// The status an order takes when dropped into this column.
    pub fn target_status(self) -> ProductionStatus {
        match self {
            Self::Pending => ProductionStatus::Pending,
            Self::InProduction => ProductionStatus::InProduction,
            Self::ReadyToShip => ProductionStatus::ReadyToShip,
            Self::Delivered => ProductionStatus::Delivered,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: OrderItemId,
    pub material_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderComment {
    pub comment_id: CommentId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAttachment {
    pub attachment_id: AttachmentId,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub update_id: StatusUpdateId,
    pub status: ProductionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A supplier order as mirrored from the remote store. The client keeps a
/// transient copy for the lifetime of the view and applies optimistic
/// mutations that the next refresh reconciles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub order_number: String,
    #[serde(default)]
    pub production_status: ProductionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub comments: Vec<OrderComment>,
    #[serde(default)]
    pub attachments: Vec<OrderAttachment>,
    #[serde(default)]
    pub status_updates: Vec<StatusUpdate>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn bucket(&self) -> Option<BucketKey> {
        BucketKey::for_status(self.production_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_visible_status_maps_to_exactly_one_bucket() {
        let visible = [
            (ProductionStatus::Pending, BucketKey::Pending),
            (ProductionStatus::Confirmed, BucketKey::InProduction),
            (ProductionStatus::InProduction, BucketKey::InProduction),
            (ProductionStatus::ReadyToShip, BucketKey::ReadyToShip),
            (ProductionStatus::Delivered, BucketKey::Delivered),
        ];
        for (status, expected) in visible {
            assert_eq!(BucketKey::for_status(status), Some(expected), "{status}");
        }
        assert_eq!(BucketKey::for_status(ProductionStatus::Shipped), None);
        assert_eq!(BucketKey::for_status(ProductionStatus::Cancelled), None);
    }

    #[test]
    fn bucket_keys_round_trip_through_parse() {
        for key in BucketKey::ALL {
            assert_eq!(BucketKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(BucketKey::parse("shipped"), None);
        assert_eq!(BucketKey::parse(""), None);
        assert_eq!(BucketKey::parse("Pending"), None);
    }

    #[test]
    fn missing_status_deserializes_as_pending() {
        let raw = serde_json::json!({
            "order_id": "7f8a2f64-1111-4222-8333-444455556666",
            "order_number": "ORD-2024-001",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let order: Order = serde_json::from_value(raw).expect("order");
        assert_eq!(order.production_status, ProductionStatus::Pending);
        assert!(order.items.is_empty());
        assert!(order.comments.is_empty());
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let encoded = serde_json::to_string(&ProductionStatus::ReadyToShip).expect("encode");
        assert_eq!(encoded, "\"ready_to_ship\"");
        let decoded: ProductionStatus = serde_json::from_str("\"in_production\"").expect("decode");
        assert_eq!(decoded, ProductionStatus::InProduction);
    }

    #[test]
    fn terminal_statuses_are_delivered_and_cancelled() {
        assert!(ProductionStatus::Delivered.is_terminal());
        assert!(ProductionStatus::Cancelled.is_terminal());
        assert!(!ProductionStatus::ReadyToShip.is_terminal());
    }
}
