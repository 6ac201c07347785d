//! Serde default values.

pub fn default_command_prefix() -> String {
    "!".to_string()
}

pub fn default_version() -> String {
    format!("slirc-bot {}", env!("CARGO_PKG_VERSION"))
}

pub fn default_poll_timeout_ms() -> u64 {
    200
}

pub fn default_connect_attempts() -> u32 {
    5
}

pub fn default_connect_retry_secs() -> u64 {
    30
}

pub fn default_max_workers() -> usize {
    32
}

pub fn default_quit_message() -> String {
    "Bye!".to_string()
}

pub fn default_port() -> u16 {
    6667
}
