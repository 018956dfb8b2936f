pub const RECEIVER_PORT: u16 = 9090;
pub const RECEIVER_ADDRESS: &str = "127.0.0.1";

pub const DEFAULT_REGISTRY_PATH: &str = "config/registry.json";
pub const DEFAULT_SINK_DIR: &str = "logs";
pub const DEFAULT_PAYLOAD_DIR: &str = "payloads";
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 1000;

/// Used when a payload declares an interval shorter than one minute.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;
pub const FALLBACK_INTERVAL_SECONDS: i64 = 300;

/// Accepted range for UTC offsets, in whole hours.
pub const MIN_UTC_OFFSET_HOURS: i32 = -12;
pub const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Unsubstituted template variable some sensor firmwares send in `Utc`.
pub const UTC_PLACEHOLDER: &str = "$utcVar";

/// Upper bound on a single wire frame body.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[must_use]
pub fn receiver_address() -> String {
    format!("{RECEIVER_ADDRESS}:{RECEIVER_PORT}")
}

#[must_use]
pub fn receiver_bind_address() -> String {
    format!("0.0.0.0:{RECEIVER_PORT}")
}
