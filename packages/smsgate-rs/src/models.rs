use serde::{Deserialize, Serialize};

/// Receipt returned after a message is handed to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub to: String,
    pub channel: String,
    pub status: String,
}
