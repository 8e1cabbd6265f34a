//! Delivery loop for one attached WebSocket.
//!
//! The delivery thread is the only writer of its socket. Each turn it drains
//! the session queue, sends a ping when due, then reads client frames with a
//! short socket timeout, so producers never touch the transport directly.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Instant;

use tungstenite::WebSocket;
use tungstenite::protocol::Message;
use tungstenite::protocol::frame::CloseFrame;
use tungstenite::protocol::frame::coding::CloseCode;

use super::PushSettings;
use super::channel::SessionChannel;
use super::hub::PushHub;
use super::message::{ClientMessage, PushMessage};
use crate::core::Shutdown;
use crate::session::SessionId;

/// Close code telling the client a newer tab took over its session.
/// The client runtime does not reconnect on it.
pub const CLOSE_SUPERSEDED: u16 = 4001;

/// Why a delivery loop ended without a transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    ClientClosed,
    Superseded,
    Shutdown,
}

/// Serve one session over `ws` until the client leaves, another transport
/// takes over, shutdown is signalled, or the socket fails.
pub(crate) fn run(
    mut ws: WebSocket<TcpStream>,
    hub: &PushHub,
    session: &SessionId,
    settings: PushSettings,
    shutdown: &Shutdown,
) {
    let Some(channel) = hub.channel(session) else {
        // Stale page (pruned session or previous process): start over.
        crate::debug!("ws"; "unknown session {}, asking for reload", session);
        let _ = send(&mut ws, &PushMessage::Reload);
        let _ = ws.close(None);
        let _ = ws.flush();
        return;
    };

    if let Err(e) = ws.get_ref().set_read_timeout(Some(settings.poll_interval)) {
        crate::log!("ws"; "failed to set read timeout: {}", e);
        return;
    }

    let generation = channel.attach();
    crate::debug!("ws"; "session {} attached ({} pending)", session, channel.pending());

    let result = deliver(&mut ws, &channel, generation, hub, settings, shutdown);
    channel.detach(generation);

    match result {
        Ok(end) => crate::debug!("ws"; "session {} detached: {:?}", session, end),
        Err(e) => crate::debug!("ws"; "transport fault for {}: {}", session, e),
    }
}

fn deliver(
    ws: &mut WebSocket<TcpStream>,
    channel: &Arc<SessionChannel>,
    generation: u64,
    hub: &PushHub,
    settings: PushSettings,
    shutdown: &Shutdown,
) -> tungstenite::Result<End> {
    send(ws, &PushMessage::connected(channel.id().as_str()))?;
    let mut last_ping = Instant::now();

    loop {
        if shutdown.is_triggered() {
            close(ws, CloseCode::Away, "server shutting down");
            return Ok(End::Shutdown);
        }

        let Some(messages) = channel.take(generation) else {
            close(ws, CloseCode::Library(CLOSE_SUPERSEDED), "superseded");
            return Ok(End::Superseded);
        };
        for message in &messages {
            send(ws, message)?;
        }

        if last_ping.elapsed() >= settings.ping_interval {
            send(ws, &PushMessage::ping())?;
            last_ping = Instant::now();
        }

        match ws.read() {
            Ok(Message::Text(text)) => handle_client_message(text.as_str(), channel, hub),
            Ok(Message::Close(_)) => {
                let _ = ws.flush();
                return Ok(End::ClientClosed);
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                // Nothing from the client this turn
            }
            Err(e) => return Err(e),
        }
    }
}

fn handle_client_message(text: &str, channel: &SessionChannel, hub: &PushHub) {
    match ClientMessage::from_json(text) {
        Some(ClientMessage::Invalid { target_id }) => hub.report_invalid(channel.id(), &target_id),
        Some(ClientMessage::Pong { .. }) => {}
        None => crate::debug!("ws"; "ignoring client frame: {}", text),
    }
}

fn send(ws: &mut WebSocket<TcpStream>, message: &PushMessage) -> tungstenite::Result<()> {
    ws.send(Message::Text(message.to_json().into()))
}

fn close(ws: &mut WebSocket<TcpStream>, code: CloseCode, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    let _ = ws.close(Some(frame));
    let _ = ws.flush();
}
