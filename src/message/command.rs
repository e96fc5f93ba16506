use serde::Serialize;

/// Client → Server stream commands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OutboundCommand {
    AcknowledgeAlert { alert_id: String },
}

impl OutboundCommand {
    pub fn acknowledge(alert_id: impl Into<String>) -> Self {
        OutboundCommand::AcknowledgeAlert {
            alert_id: alert_id.into(),
        }
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
