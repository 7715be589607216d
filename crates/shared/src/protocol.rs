use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ProductionStatus;

/// Body of the status-update call issued for a drag transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ProductionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of the explicit confirm action for a pending order. The delivery
/// date has already been resolved client-side; the backend never sees the
/// accept-vs-propose distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmOrderRequest {
    pub delivery_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAttachmentRequest {
    pub file_name: String,
    pub file_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_status_omits_absent_notes() {
        let body = UpdateStatusRequest {
            status: ProductionStatus::ReadyToShip,
            notes: None,
        };
        let encoded = serde_json::to_value(&body).expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({ "status": "ready_to_ship" })
        );
    }

    #[test]
    fn confirm_request_carries_resolved_date() {
        let body = ConfirmOrderRequest {
            delivery_date: NaiveDate::from_ymd_opt(2024, 3, 15).expect("date"),
            notes: Some("anticipated by a week".to_string()),
        };
        let encoded = serde_json::to_value(&body).expect("encode");
        assert_eq!(encoded["delivery_date"], "2024-03-15");
        assert_eq!(encoded["notes"], "anticipated by a week");
    }
}
