//! Control interface: JSON line protocol for production software
//!
//! Control clients query and set tally state and may subscribe to change
//! notifications. One command per line, one response per line; a malformed
//! command earns `{"result":"error"}` but never closes the connection.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::server::protocol::{ChangeNotification, CommandResponse, ControlCommand};
use crate::state::TallyStateManager;

/// Per-subscriber change queue depth. A control client that stalls long
/// enough to overflow this loses the oldest deltas and keeps receiving from
/// the current change onward.
const CHANGE_QUEUE_DEPTH: usize = 64;

/// JSON command/notification server for control clients.
pub struct ControlInterface {
    manager: Arc<TallyStateManager>,
    change_tx: broadcast::Sender<ChangeNotification>,
}

impl ControlInterface {
    /// Create the interface and register its change observer with the
    /// state manager.
    pub fn new(manager: Arc<TallyStateManager>) -> Result<Arc<Self>> {
        let (change_tx, _) = broadcast::channel(CHANGE_QUEUE_DEPTH);

        let tx = change_tx.clone();
        manager.register_observer(Arc::new(move |camera: u32, old: &_, new: &_| {
            // No receivers just means no subscribed client is connected.
            let _ = tx.send(ChangeNotification::new(camera, old, new));
        }))?;

        Ok(Arc::new(Self { manager, change_tx }))
    }

    /// Accept control connections forever.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::info!("Control client connected from {}", addr);
                    let iface = Arc::clone(&self);
                    tokio::spawn(async move {
                        iface.handle_connection(stream).await;
                        tracing::info!("Control client {} disconnected", addr);
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept control connection: {}", e);
                }
            }
        }
    }

    /// Handle a single control connection until `quit`, EOF, or an I/O
    /// failure. Socket errors are normal disconnects, never daemon errors.
    pub async fn handle_connection(self: Arc<Self>, stream: TcpStream) {
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut change_rx = self.change_tx.subscribe();
        let mut subscribed = false;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            tracing::debug!("Control read failed: {}", e);
                            break;
                        }
                    };

                    let (response, quit) = self.execute(&line, &mut subscribed);
                    if let Some(response) = response {
                        if write_json_line(&mut write_half, &response).await.is_err() {
                            break;
                        }
                    }
                    if quit {
                        break;
                    }
                }

                change = change_rx.recv() => {
                    match change {
                        Ok(notification) => {
                            if subscribed
                                && write_json_line(&mut write_half, &notification)
                                    .await
                                    .is_err()
                            {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::debug!(missed, "Control subscriber lagged, dropping deltas");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    /// Run one command line. Returns the response to write (none for
    /// `quit`) and whether the connection loop should end.
    fn execute(&self, line: &str, subscribed: &mut bool) -> (Option<CommandResponse>, bool) {
        match self.run_command(line, subscribed) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!("Control command rejected: {}", e);
                (Some(CommandResponse::error()), false)
            }
        }
    }

    fn run_command(
        &self,
        line: &str,
        subscribed: &mut bool,
    ) -> Result<(Option<CommandResponse>, bool)> {
        match ControlCommand::parse(line)? {
            ControlCommand::Subscribe => {
                *subscribed = true;
                Ok((Some(CommandResponse::ok()), false))
            }
            ControlCommand::Set { camera, kind } => {
                self.manager.set_tally(camera, &kind)?;
                Ok((Some(CommandResponse::ok()), false))
            }
            ControlCommand::Get { camera } => {
                let state = self.manager.get_tally(camera)?;
                Ok((Some(CommandResponse::tally(&state)), false))
            }
            ControlCommand::Quit => Ok((None, true)),
        }
    }
}

async fn write_json_line<W, T>(writer: &mut W, value: &T) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let mut buf = serde_json::to_vec(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    buf.push(b'\n');
    writer.write_all(&buf).await
}
