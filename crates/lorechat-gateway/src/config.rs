use std::time::Duration;

/// Tunables for the chat core and the per-connection loop.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Capacity of each connection's outbound queue. A recipient whose
    /// queue is full when an event arrives is kicked.
    pub outbox_capacity: usize,
    /// Upper bound on a single socket write before the connection is dropped.
    pub send_timeout: Duration,
    /// Server Ping interval; two missed Pongs drop the connection.
    pub heartbeat_interval: Duration,
    /// Maximum message length in characters, after trimming.
    pub max_message_len: usize,
    /// When false, only channels listed in the directory can be joined.
    pub open_channels: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 256,
            send_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(15),
            max_message_len: 2000,
            open_channels: true,
        }
    }
}
