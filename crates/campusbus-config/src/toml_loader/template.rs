//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Campus bus tracker configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Environment variables (CAMPUSBUS_*) override values in this file.

[broadcast]
# host = "localhost"              # CAMPUSBUS_BROADCAST_HOST
# port = 6001                     # CAMPUSBUS_BROADCAST_PORT
# app_key = ""                    # CAMPUSBUS_BROADCAST_KEY
# secure = false                  # CAMPUSBUS_BROADCAST_SECURE
# heartbeat_interval_secs = 25    # 5-300
# connect_timeout_secs = 15       # 1-120
# channel = "private-LocationChannel"
# event = "NewLocationReceived"
# match_location_shape = true

[api]
# base_url = ""                   # CAMPUSBUS_API_BASE_URL
# broadcast_auth_path = "/broadcasting/auth"
# token = ""                      # CAMPUSBUS_API_TOKEN
# auth_timeout_secs = 0           # 0 = no timeout

[reconnect]
# enabled = false
# base_delay_ms = 1000
# max_delay_ms = 30000
# max_attempts = 0                # 0 = unlimited

[logging]
# level = "INFO"                  # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
