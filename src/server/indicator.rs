//! Indicator interface: binary snapshot frames for tally-light hardware
//!
//! Every connected indicator client receives the full snapshot frame on
//! every tally change. A client may also send any line (content ignored) to
//! pull one fresh frame, so simple hardware can poll instead of listening.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::server::protocol::snapshot_frame;
use crate::state::TallyStateManager;

/// Wake queue depth. Lagging is harmless here: every wake triggers a full
/// snapshot recomputation, so a missed wake is covered by the next one.
const WAKE_QUEUE_DEPTH: usize = 16;

/// Binary-protocol server for indicator clients.
pub struct ClientInterface {
    manager: Arc<TallyStateManager>,
    wake_tx: broadcast::Sender<()>,
}

impl ClientInterface {
    /// Create the interface and register its wake observer with the state
    /// manager. Any change, for any camera, wakes every connection.
    pub fn new(manager: Arc<TallyStateManager>) -> Result<Arc<Self>> {
        let (wake_tx, _) = broadcast::channel(WAKE_QUEUE_DEPTH);

        let tx = wake_tx.clone();
        manager.register_observer(Arc::new(move |_: u32, _: &_, _: &_| {
            let _ = tx.send(());
        }))?;

        Ok(Arc::new(Self { manager, wake_tx }))
    }

    /// Accept indicator connections forever.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::info!("Indicator client connected from {}", addr);
                    let iface = Arc::clone(&self);
                    tokio::spawn(async move {
                        iface.handle_connection(stream).await;
                        tracing::info!("Indicator client {} disconnected", addr);
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept indicator connection: {}", e);
                }
            }
        }
    }

    /// Handle one indicator connection until EOF or an I/O failure.
    pub async fn handle_connection(self: Arc<Self>, stream: TcpStream) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut wake_rx = self.wake_tx.subscribe();
        let mut line = Vec::new();

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut line) => {
                    match read {
                        Ok(0) => break,
                        Ok(_) => {
                            // Any line, whatever its content, pulls a frame.
                            line.clear();
                            if write_half.write_all(&self.current_frame()).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!("Indicator read failed: {}", e);
                            break;
                        }
                    }
                }

                wake = wake_rx.recv() => {
                    match wake {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            if write_half.write_all(&self.current_frame()).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    fn current_frame(&self) -> Vec<u8> {
        snapshot_frame(&self.manager.all_numeric_tally())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::protocol::{LF, STX};

    fn interface() -> Arc<ClientInterface> {
        let manager = Arc::new(
            TallyStateManager::new(vec!["live".to_string(), "preview".to_string()]).unwrap(),
        );
        ClientInterface::new(manager).unwrap()
    }

    #[test]
    fn test_frame_tracks_manager_state() {
        let iface = interface();
        assert_eq!(iface.current_frame(), vec![STX, LF]);

        iface.manager.set_tally(1, "preview").unwrap();
        iface.manager.set_tally(2, "live").unwrap();
        assert_eq!(iface.current_frame(), vec![STX, 0x02, 0x01, LF]);
    }

    #[test]
    fn test_any_change_wakes_connections() {
        let iface = interface();
        let mut rx = iface.wake_tx.subscribe();

        iface.manager.set_tally(3, "live").unwrap();
        assert!(rx.try_recv().is_ok());

        // No-op transitions do not wake anyone.
        iface.manager.set_tally(3, "live").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
