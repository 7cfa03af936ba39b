//! Platform device identifier.

use std::sync::OnceLock;

static DEVICE_ID: OnceLock<String> = OnceLock::new();

const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Stable identifier for this device.
///
/// Uses the OS machine id where one exists, otherwise a random UUID generated
/// once per process.
pub fn device_identifier() -> &'static str {
    DEVICE_ID.get_or_init(|| {
        MACHINE_ID_PATHS
            .iter()
            .find_map(|path| {
                std::fs::read_to_string(path)
                    .ok()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
            })
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
    })
}
