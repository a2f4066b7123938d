//! Background socket task: handshake, heartbeat, delivery and reconnect.

use std::sync::Arc;

use campusbus_common::{AuthError, ConnectionId, RealtimeError};
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use super::backoff::Backoff;
use super::handler::{classify_text, is_fatal_code, EventMatcher, Inbound};
use super::types::{ChannelClientConfig, ConnectionStatus, HandshakeState, PusherMessage};
use crate::authorizer::ChannelAuthorizer;

pub(crate) type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;

type AuthResult = Result<String, AuthError>;

/// Everything one connection task needs. Owned by the task; the client
/// keeps only the cancellation token and the join handle.
pub(crate) struct Session {
    pub(crate) config: ChannelClientConfig,
    pub(crate) channel: String,
    pub(crate) matcher: EventMatcher,
    pub(crate) authorizer: Arc<dyn ChannelAuthorizer>,
    pub(crate) on_message: MessageHandler,
    pub(crate) status_tx: watch::Sender<ConnectionStatus>,
    pub(crate) cancel: CancellationToken,
}

impl Session {
    fn set_status(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }
}

enum SessionEnd {
    Shutdown,
    Dropped { reason: String, subscribed: bool },
    Fatal(String),
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Drive one channel subscription until cancelled.
pub(crate) async fn connection_loop(session: Session) {
    let mut backoff = Backoff::new(session.config.reconnect.clone());

    loop {
        let conn = ConnectionId::new();
        let span = info_span!("channel", conn = %conn, channel = %session.channel);
        let end = run_session(&session).instrument(span).await;

        let reason = match end {
            SessionEnd::Shutdown => break,
            SessionEnd::Fatal(reason) => reason,
            SessionEnd::Dropped { reason, subscribed } => {
                if subscribed {
                    backoff.reset();
                }
                match backoff.next_delay() {
                    Some(delay) => {
                        let attempt = backoff.attempt();
                        warn!(
                            channel = %session.channel,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            reason = %reason,
                            "Connection lost, reconnecting"
                        );
                        session.set_status(ConnectionStatus::Reconnecting { attempt, delay });
                        let cancelled = tokio::select! {
                            _ = session.cancel.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        };
                        if cancelled {
                            break;
                        }
                        continue;
                    }
                    None => reason,
                }
            }
        };

        error!(channel = %session.channel, reason = %reason, "Channel connection failed");
        session.set_status(ConnectionStatus::Failed(reason));
        // Park until the owner lets go so the final status reads Closed.
        session.cancel.cancelled().await;
        break;
    }

    session.set_status(ConnectionStatus::Closed);
    debug!(channel = %session.channel, "Connection task finished");
}

/// One socket lifetime: open, handshake, then pump frames until it ends.
async fn run_session(session: &Session) -> SessionEnd {
    session.set_status(ConnectionStatus::Connecting);
    info!(url = %session.config.log_url(), "Connecting to broadcaster");

    let url = session.config.ws_url();
    let connect = tokio::time::timeout(
        session.config.connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    );

    let ws_stream = tokio::select! {
        _ = session.cancel.cancelled() => return SessionEnd::Shutdown,
        result = connect => match result {
            Ok(Ok((ws_stream, _))) => ws_stream,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to open socket");
                return SessionEnd::Dropped {
                    reason: format!("connect failed: {e}"),
                    subscribed: false,
                };
            }
            Err(_elapsed) => {
                error!(
                    timeout_secs = session.config.connect_timeout.as_secs(),
                    "Socket open timed out"
                );
                return SessionEnd::Dropped {
                    reason: format!(
                        "connect timed out after {}s",
                        session.config.connect_timeout.as_secs()
                    ),
                    subscribed: false,
                };
            }
        },
    };

    info!("Socket open");
    let (mut sink, mut stream) = ws_stream.split();
    let mut state = HandshakeState::SocketOpen;

    let period = session.config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let (auth_tx, mut auth_rx) = mpsc::channel::<AuthResult>(1);

    loop {
        let subscribed = state == HandshakeState::Subscribed;

        tokio::select! {
            _ = session.cancel.cancelled() => {
                debug!("Closing socket");
                let _ = sink.send(WsMessage::Close(None)).await;
                return SessionEnd::Shutdown;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = send_frame(&mut sink, &PusherMessage::ping()).await {
                    warn!(error = %e, "Heartbeat failed");
                    return SessionEnd::Dropped { reason: e.to_string(), subscribed };
                }
                trace!("Heartbeat sent");
            }
            Some(result) = auth_rx.recv() => match result {
                Ok(auth) => {
                    if state != HandshakeState::SocketIdReceived {
                        debug!(?state, "Ignoring channel authorization in unexpected state");
                        continue;
                    }
                    let subscribe = PusherMessage::subscribe(&session.channel, &auth);
                    if let Err(e) = send_frame(&mut sink, &subscribe).await {
                        warn!(error = %e, "Subscribe request failed");
                        return SessionEnd::Dropped { reason: e.to_string(), subscribed };
                    }
                    state = HandshakeState::ChannelAuthorized;
                    info!("Subscribe request sent");
                }
                Err(e) => {
                    error!(error = %e, "Channel authorization failed");
                    session.set_status(ConnectionStatus::Failed(format!(
                        "authorization failed: {e}"
                    )));
                }
            },
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(close))) => {
                        let code = close.as_ref().map(|f| u16::from(f.code));
                        let reason = match &close {
                            Some(f) => format!(
                                "closed by broadcaster ({}): {}",
                                u16::from(f.code),
                                f.reason.as_str()
                            ),
                            None => "closed by broadcaster".to_string(),
                        };
                        info!(code = ?code, "Broadcaster closed the socket");
                        if code.is_some_and(is_fatal_code) {
                            return SessionEnd::Fatal(reason);
                        }
                        return SessionEnd::Dropped { reason, subscribed };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(error = %e, "Socket error");
                        return SessionEnd::Dropped {
                            reason: format!("socket error: {e}"),
                            subscribed,
                        };
                    }
                    None => {
                        info!("Socket closed");
                        return SessionEnd::Dropped {
                            reason: "socket closed".to_string(),
                            subscribed,
                        };
                    }
                };

                let inbound = classify_text(&text, &session.matcher);
                if let Err(end) = handle_inbound(session, inbound, &mut state, &mut sink, &auth_tx).await {
                    return end;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound Frames
// ---------------------------------------------------------------------------

async fn handle_inbound<S>(
    session: &Session,
    inbound: Inbound,
    state: &mut HandshakeState,
    sink: &mut S,
    auth_tx: &mpsc::Sender<AuthResult>,
) -> Result<(), SessionEnd>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    match inbound {
        Inbound::ConnectionEstablished { socket_id } => {
            if *state != HandshakeState::SocketOpen {
                debug!(socket_id = %socket_id, "Repeated connection_established ignored");
                return Ok(());
            }
            info!(socket_id = %socket_id, "Socket id received");
            *state = HandshakeState::SocketIdReceived;
            session.set_status(ConnectionStatus::Authorizing);
            spawn_authorization(session, socket_id, auth_tx.clone());
        }
        Inbound::SubscriptionSucceeded { channel } => {
            if let Some(other) = channel.as_deref().filter(|c| *c != session.channel) {
                debug!(other = %other, "Subscription confirmation for another channel");
                return Ok(());
            }
            info!("Subscribed");
            *state = HandshakeState::Subscribed;
            session.set_status(ConnectionStatus::Subscribed);
        }
        Inbound::Ping => {
            if let Err(e) = send_frame(sink, &PusherMessage::pong()).await {
                warn!(error = %e, "Pong failed");
                return Err(SessionEnd::Dropped {
                    reason: e.to_string(),
                    subscribed: *state == HandshakeState::Subscribed,
                });
            }
        }
        Inbound::Pong => trace!("Pong received"),
        Inbound::Error { code, message } => {
            warn!(code = ?code, message = %message, "Broadcaster error");
            if let Some(code) = code.filter(|c| is_fatal_code(*c)) {
                return Err(SessionEnd::Fatal(format!(
                    "broadcaster error {code}: {message}"
                )));
            }
        }
        Inbound::Deliver(payload) => {
            trace!("Delivering event payload");
            (session.on_message)(payload);
        }
        Inbound::ShapeMismatch { event } => {
            warn!(event = %event, "Location-shaped payload under an unregistered event dropped");
        }
        Inbound::Unrecognized { event } => debug!(event = %event, "Unhandled event dropped"),
        Inbound::Malformed(reason) => warn!(reason = %reason, "Dropping malformed frame"),
    }
    Ok(())
}

/// Exchange the socket id for a channel signature without blocking the
/// frame loop. The result is dropped if the socket is gone by then.
fn spawn_authorization(session: &Session, socket_id: String, auth_tx: mpsc::Sender<AuthResult>) {
    let authorizer = Arc::clone(&session.authorizer);
    let channel = session.channel.clone();
    tokio::spawn(
        async move {
            let result = authorizer.authorize(&socket_id, &channel).await;
            let _ = auth_tx.send(result).await;
        }
        .in_current_span(),
    );
}

async fn send_frame<S>(sink: &mut S, msg: &PusherMessage) -> Result<(), RealtimeError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(msg).map_err(|e| RealtimeError::Transport(e.to_string()))?;
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| RealtimeError::Transport(e.to_string()))
}
