//! campusbus-tracker: headless live view of the campus bus fleet.
//!
//! Joins the private location channel and keeps the latest position of
//! every bus, or follows the service events channel, logging connection
//! progress until interrupted.

mod board;
mod notice;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use campusbus_common::{new_correlation_id, CampusBusError};
use campusbus_config::CampusBusConfig;
use campusbus_realtime::{
    ChannelClientConfig, ConnectionStatus, HttpAuthorizer, LocationPayload, RealtimeClient,
    ReconnectPolicy,
};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::Instrument;

use crate::board::{BusBoard, Upsert};
use crate::notice::{NoticeLog, EVENTS_CHANNEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Feed {
    /// Bus positions on the location channel.
    Locations,
    /// Safety and service notices on the events channel.
    Events,
}

impl Feed {
    fn default_channel(self, config: &CampusBusConfig) -> String {
        match self {
            Feed::Locations => config.broadcast.channel.clone(),
            Feed::Events => EVENTS_CHANNEL.to_string(),
        }
    }
}

#[derive(Parser)]
#[command(name = "campusbus-tracker", about = "Follow live campus bus locations")]
struct Args {
    /// Config file (default: <config dir>/campusbus/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to follow.
    #[arg(long, value_enum, default_value_t = Feed::Locations)]
    feed: Feed,

    /// Channel to join instead of the feed's default.
    #[arg(long)]
    channel: Option<String>,

    /// Event name to listen for instead of the configured one.
    #[arg(long)]
    event: Option<String>,

    /// Only deliver frames whose event name matches.
    #[arg(long)]
    strict: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match campusbus_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("campusbus-tracker: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = config.logging.level.as_filter();
                format!("campusbus_tracker={level},campusbus_realtime={level},campusbus_config={level}")
                    .into()
            }),
        )
        .init();

    if args.print_config {
        println!("{}", campusbus_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    let run_id = new_correlation_id();
    let span = tracing::info_span!("tracker", run = %run_id);

    match run(args, config).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Tracker stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: CampusBusConfig) -> Result<(), CampusBusError> {
    let channel = args
        .channel
        .unwrap_or_else(|| args.feed.default_channel(&config));
    let event = args.event.unwrap_or_else(|| config.broadcast.event.clone());

    let mut client_config = client_config(&config);
    if args.strict {
        client_config.match_location_shape = false;
    }

    let authorizer = HttpAuthorizer::new(
        config.api.broadcast_auth_url(),
        config.api.bearer_token().map(str::to_string),
        secs(config.api.auth_timeout_secs),
    )?;
    tracing::info!(endpoint = %authorizer.endpoint(), "Using broadcast auth endpoint");

    let board = Arc::new(Mutex::new(BusBoard::new()));
    let notices = Arc::new(Mutex::new(NoticeLog::default()));
    let mut client = RealtimeClient::new(client_config, Arc::new(authorizer));

    let handle = match args.feed {
        Feed::Locations => {
            let sink = Arc::clone(&board);
            client
                .connect(&channel, &event, move |payload| on_location(&sink, payload))
                .await?
        }
        Feed::Events => {
            let sink = Arc::clone(&notices);
            client
                .connect(&channel, &event, move |payload| on_notice(&sink, payload))
                .await?
        }
    };

    let mut status = handle.watch_status();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                tracing::info!("Interrupted, shutting down");
                break Ok(());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = status.borrow_and_update().clone();
                match current {
                    ConnectionStatus::Failed(reason) => {
                        break Err(CampusBusError::Other(format!("channel connection failed: {reason}")));
                    }
                    ConnectionStatus::Reconnecting { attempt, delay } => {
                        tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
                    }
                    other => tracing::info!(status = ?other, channel = %channel, "Connection status"),
                }
            }
        }
    };

    client.disconnect().await;

    match args.feed {
        Feed::Locations => log_board(&board),
        Feed::Events => log_notices(&notices),
    }

    outcome
}

fn log_board(board: &Mutex<BusBoard>) {
    if let Ok(board) = board.lock() {
        tracing::info!(buses = board.len(), "Final board");
        for marker in board.markers() {
            tracing::info!(
                bus = %marker.bus,
                lat = marker.position.latitude,
                lng = marker.position.longitude,
                updates = marker.updates,
                "Bus"
            );
        }
    }
}

fn log_notices(notices: &Mutex<NoticeLog>) {
    if let Ok(log) = notices.lock() {
        tracing::info!(
            received = log.received(),
            urgent = log.urgent(),
            last = ?log.last(),
            "Service events summary"
        );
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn on_location(board: &Mutex<BusBoard>, payload: Value) {
    let location = match LocationPayload::from_value(&payload) {
        Ok(location) => location,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring payload that is not a bus location");
            return;
        }
    };

    let Ok(mut board) = board.lock() else {
        tracing::error!("Bus board lock poisoned");
        return;
    };
    match board.upsert(&location) {
        Some(Upsert::Inserted) => tracing::info!(
            bus = ?location.bus_key(),
            lat = location.location.latitude,
            lng = location.location.longitude,
            "Bus appeared"
        ),
        Some(Upsert::Updated) => tracing::debug!(
            bus = ?location.bus_key(),
            lat = location.location.latitude,
            lng = location.location.longitude,
            "Bus moved"
        ),
        None => tracing::debug!("Location without a bus id ignored"),
    }
}

fn on_notice(notices: &Mutex<NoticeLog>, payload: Value) {
    let Ok(mut log) = notices.lock() else {
        tracing::error!("Notice log lock poisoned");
        return;
    };
    match log.record(&payload) {
        Some(notice) if notice.is_urgent() => tracing::warn!(
            name = %notice.name,
            severity = ?notice.severity,
            description = ?notice.description,
            "Service event"
        ),
        Some(notice) => tracing::info!(
            name = %notice.name,
            severity = ?notice.severity,
            "Service event"
        ),
        None => tracing::info!(payload = %payload, "Service events changed"),
    }
}

/// Zero means "no limit".
fn secs(value: u32) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(u64::from(value)))
}

fn client_config(config: &CampusBusConfig) -> ChannelClientConfig {
    let broadcast = &config.broadcast;
    let reconnect = &config.reconnect;

    ChannelClientConfig {
        host: broadcast.host.clone(),
        port: broadcast.port,
        app_key: broadcast.app_key.clone(),
        secure: broadcast.secure,
        heartbeat_interval: Duration::from_secs(u64::from(broadcast.heartbeat_interval_secs)),
        connect_timeout: Duration::from_secs(u64::from(broadcast.connect_timeout_secs)),
        match_location_shape: broadcast.match_location_shape,
        reconnect: ReconnectPolicy {
            enabled: reconnect.enabled,
            base_delay: Duration::from_millis(reconnect.base_delay_ms),
            max_delay: Duration::from_millis(reconnect.max_delay_ms),
            max_attempts: (reconnect.max_attempts > 0).then_some(reconnect.max_attempts),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_config_onto_client_config() {
        let mut config = CampusBusConfig::default();
        config.broadcast.app_key = "key".into();
        config.reconnect.enabled = true;
        config.reconnect.max_attempts = 5;

        let client = client_config(&config);
        assert_eq!(client.host, "localhost");
        assert_eq!(client.port, 6001);
        assert_eq!(client.heartbeat_interval, Duration::from_secs(25));
        assert!(client.match_location_shape);
        assert!(client.reconnect.enabled);
        assert_eq!(client.reconnect.max_attempts, Some(5));
        assert_eq!(client.reconnect.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn zero_attempts_means_unlimited() {
        let config = CampusBusConfig::default();
        assert_eq!(client_config(&config).reconnect.max_attempts, None);
    }

    #[test]
    fn zero_seconds_is_no_timeout() {
        assert_eq!(secs(0), None);
        assert_eq!(secs(10), Some(Duration::from_secs(10)));
    }

    #[test]
    fn handler_folds_locations_into_board() {
        let board = Mutex::new(BusBoard::new());
        let frame = json!({
            "location": { "latitude": 1.5, "longitude": 2.5 },
            "user": { "id": 7, "name": "x" },
            "additional": { "bus_id": 7 }
        });
        on_location(&board, frame.clone());
        on_location(&board, frame);
        on_location(&board, json!({ "unrelated": true }));

        let board = board.lock().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board.markers()[0].updates, 2);
    }

    #[test]
    fn events_feed_defaults_to_events_channel() {
        let config = CampusBusConfig::default();
        assert_eq!(Feed::Events.default_channel(&config), "private-EventChannel");
        assert_eq!(Feed::Locations.default_channel(&config), "private-LocationChannel");
    }

    #[test]
    fn events_args_parse() {
        let args = Args::parse_from(["campusbus-tracker", "--feed", "events"]);
        assert_eq!(args.feed, Feed::Events);
        assert!(args.channel.is_none());
    }

    #[test]
    fn notice_handler_records_every_payload() {
        let notices = Mutex::new(NoticeLog::default());
        on_notice(&notices, json!({ "name": "Road closed", "severity": "C" }));
        on_notice(&notices, json!({ "refresh": true }));

        let log = notices.lock().unwrap();
        assert_eq!(log.received(), 2);
        assert_eq!(log.urgent(), 1);
    }
}
