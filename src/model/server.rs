use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Offline,
    Maintenance,
}

impl ServerStatus {
    /// Short lowercase name, as used for the status badge.
    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
            ServerStatus::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    #[serde(alias = "ip")]
    pub address: String,
    pub location: String,
    /// Human readable, e.g. "72 days"
    pub uptime: String,
    /// Last simulated ping in milliseconds, unset until the ping phase visits the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<f64>,
}

impl ServerRecord {
    pub fn new(
        id: &str,
        name: &str,
        status: ServerStatus,
        address: &str,
        location: &str,
        uptime: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status,
            address: address.to_string(),
            location: location.to_string(),
            uptime: uptime.to_string(),
            ping: None,
        }
    }
}
