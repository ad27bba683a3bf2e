use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::message::NewMessage;
use crate::utils::validation::not_blank;

pub const SUCCESS_MESSAGE: &str = "Message received successfully on the bridge.";
pub const FAILURE_MESSAGE: &str = "Transmission failed.";

/// Contact form body. Unknown fields, including any client-side
/// `timestamp`, are ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 320), custom(function = "not_blank"))]
    pub email: String,
    #[validate(length(max = 5000), custom(function = "not_blank"))]
    pub message: String,
}

impl From<ContactRequest> for NewMessage {
    fn from(req: ContactRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            message: req.message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    pub fn received() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ContactRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn blank_fields_fail_validation() {
        let req = parse(json!({ "name": "  ", "email": "ada@example.com", "message": "Hello" }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn oversized_message_fails_validation() {
        let req = parse(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "x".repeat(5001),
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn ignores_client_timestamp() {
        let req = parse(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "Hello",
            "timestamp": "2020-01-01T00:00:00Z",
        }));
        assert!(req.validate().is_ok());
        assert_eq!(NewMessage::from(req).name, "Ada");
    }
}
