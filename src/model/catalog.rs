use super::server::{ServerRecord, ServerStatus};

/// The fixed set of servers the board is populated with when no servers file is given.
pub fn demo_servers() -> Vec<ServerRecord> {
    vec![
        ServerRecord::new(
            "1",
            "Server Alpha",
            ServerStatus::Online,
            "192.168.1.1",
            "New York, USA",
            "72 days",
        ),
        ServerRecord::new(
            "2",
            "Server Beta",
            ServerStatus::Offline,
            "192.168.1.2",
            "San Francisco, USA",
            "0 days",
        ),
        ServerRecord::new(
            "3",
            "Server Gamma",
            ServerStatus::Maintenance,
            "192.168.1.3",
            "London, UK",
            "15 days",
        ),
        ServerRecord::new(
            "4",
            "Server Delta",
            ServerStatus::Online,
            "192.168.1.4",
            "Tokyo, Japan",
            "120 days",
        ),
        ServerRecord::new(
            "5",
            "Server Epsilon",
            ServerStatus::Online,
            "192.168.1.5",
            "Sydney, Australia",
            "200 days",
        ),
    ]
}
