use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use lorechat_types::error::ChatError;
use lorechat_types::events::ClientCommand;
use lorechat_types::models::{AuthContext, ConnectionId};

use crate::config::GatewayConfig;
use crate::dispatcher::Dispatcher;
use crate::gateway::{ChatGateway, Services};
use crate::outbox::Outbox;

/// Serve one authenticated WebSocket connection until the transport goes
/// away, then run disconnect cleanup.
///
/// Two tasks per connection: the reader feeds commands to the
/// [`ChatGateway`] strictly in arrival order, the writer drains the
/// connection's outbox onto the socket and runs the heartbeat.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    services: Services,
    auth: AuthContext,
) {
    let config = dispatcher.config().clone();
    let (outbox, mut outbox_rx) = Outbox::channel(config.outbox_capacity);
    let kicked = outbox.kick_token();

    let mut gateway = match ChatGateway::connect(dispatcher.clone(), services, auth.clone(), outbox).await {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("{} ({}) could not register: {}", auth.user_name, auth.user_id, e);
            return;
        }
    };
    let connection_id = gateway.id();

    let (mut sender, mut receiver) = socket.split();

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                _ = kicked.cancelled() => {
                    warn!("Connection {} fell behind, dropping it", connection_id);
                    break;
                }
                event = outbox_rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Failed to encode event for {}: {}", connection_id, e);
                            continue;
                        }
                    };

                    if !write_frame(&mut sender, Message::Text(text.into()), &config, &kicked, connection_id).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection {}", missed_heartbeats, connection_id);
                            break;
                        }
                    }
                    if !write_frame(&mut sender, Message::Ping(vec![].into()), &config, &kicked, connection_id).await {
                        break;
                    }
                }
            }
        }

        // A kicked peer is not reading; a close frame would only stall.
        if !kicked.is_cancelled() {
            let _ = tokio::time::timeout(config.send_timeout, sender.close()).await;
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(cmd) => gateway.handle(cmd).await,
                    Err(e) => {
                        warn!(
                            "{} ({}) bad command: {} -- raw: {}",
                            gateway.auth().user_name,
                            gateway.id(),
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                        gateway.report_error(&ChatError::InvalidCommand(e.to_string()));
                    }
                },
                Message::Binary(_) => {
                    warn!("{} sent a binary frame, closing", gateway.id());
                    break;
                }
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        gateway.disconnect();
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // The reader may have been aborted before its own cleanup ran; a
    // second disconnect is a no-op.
    dispatcher.disconnect(connection_id);
    info!("{} ({}) connection {} closed", auth.user_name, auth.user_id, connection_id);
}

/// Write one frame, bounded by `send_timeout` and abandoned on kick.
/// Returns false once the connection should end.
async fn write_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: Message,
    config: &GatewayConfig,
    kicked: &CancellationToken,
    connection_id: ConnectionId,
) -> bool {
    tokio::select! {
        _ = kicked.cancelled() => {
            warn!("Connection {} fell behind, dropping it", connection_id);
            false
        }
        written = tokio::time::timeout(config.send_timeout, sender.send(frame)) => match written {
            Ok(Ok(())) => true,
            Ok(Err(_)) => false,
            Err(_) => {
                warn!("Write to {} timed out, dropping connection", connection_id);
                false
            }
        },
    }
}
