use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum SessionState {
    #[default]
    Unlinked,
    Pairing,
    Ready,
}

/// Snapshot of the linked WhatsApp session as polled by the settings page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[ts(export)]
pub struct WhatsAppStatus {
    pub linked: bool,
    pub status: SessionState,
    pub number: Option<String>,
    /// `data:image/png;base64,...`, only while pairing
    pub qr: Option<String>,
}

impl WhatsAppStatus {
    pub fn unlinked() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlinked_wire_format() {
        let value = serde_json::to_value(WhatsAppStatus::unlinked()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "linked": false,
                "status": "UNLINKED",
                "number": null,
                "qr": null
            })
        );
    }
}
