//! Scanner TCP listener: accept loop and per-scanner connection tasks.
//!
//! Network barcode scanners (fixed-mount units like the Matrix series) open a
//! plain TCP connection and write each scanned code as raw bytes terminated
//! by a newline.  There is no handshake and no acknowledgment: the scanner
//! writes, the relay reads.
//!
//! Each accepted connection owns one [`Accumulator`] in byte-stream mode.
//! Inbound chunks are fed straight into it; a completed scan goes to the
//! dispatch channel.  When the scanner disconnects (or the socket errors)
//! the task ends and the accumulator — including any half-received scan — is
//! dropped with it.
//!
//! Arbitrarily many scanners may be connected at once; each gets its own
//! task and its own buffer.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use scanrelay_core::{Accumulator, ScanEvent, ScanSource};

use crate::domain::config::RelayConfig;

/// Runs the scanner accept loop until `running` is set to `false`.
///
/// Binds a TCP listener on `config.scanner_bind_addr`; each accepted scanner
/// connection is handed to its own Tokio task.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.  Per-connection
/// problems are logged and contained; the loop keeps accepting.
pub async fn run_scanner_listener(
    config: Arc<RelayConfig>,
    events: mpsc::UnboundedSender<ScanEvent>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.scanner_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind scanner listener on {}",
                config.scanner_bind_addr
            )
        })?;

    info!("scanner TCP listener on {}", config.scanner_bind_addr);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping scanner accept loop");
            break;
        }

        // Same short-timeout accept pattern as the WebSocket loop so the
        // shutdown flag is observed while idle.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("scanner connected from {peer_addr}");
                let events = events.clone();

                tokio::spawn(async move {
                    handle_scanner_connection(stream, peer_addr, events).await;
                });
            }
            Ok(Err(e)) => {
                error!("scanner accept error: {e}");
            }
            Err(_) => {
                // Timeout — loop back to check the flag.
            }
        }
    }

    Ok(())
}

/// Reads one scanner connection to completion.
///
/// The accumulator lives exactly as long as the connection: created here,
/// dropped (with any partial scan) on EOF or error.
async fn handle_scanner_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    events: mpsc::UnboundedSender<ScanEvent>,
) {
    let mut accumulator = Accumulator::new(ScanSource::Tcp);
    let mut read_buf = vec![0u8; 1024];

    loop {
        match stream.read(&mut read_buf).await {
            Ok(0) => {
                // EOF — the scanner closed the connection.
                info!("scanner {peer_addr} disconnected");
                break;
            }
            Ok(n) => {
                if let Some(event) = accumulator.feed_bytes(&read_buf[..n]) {
                    debug!("scanner {peer_addr}: completed scan {:?}", event.payload);
                    if events.send(event).is_err() {
                        // Dispatcher gone — the process is shutting down.
                        debug!("scanner {peer_addr}: dispatch channel closed; ending");
                        break;
                    }
                }
            }
            Err(e) => {
                // Socket fault: log, discard the buffer with the task, keep
                // the listener accepting other scanners.
                warn!("scanner {peer_addr}: socket error: {e}");
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    /// Starts the listener on an ephemeral port and returns its address and
    /// the dispatch receiver.
    async fn start_test_listener() -> (
        SocketAddr,
        mpsc::UnboundedReceiver<ScanEvent>,
        Arc<AtomicBool>,
    ) {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let config = Arc::new(RelayConfig {
            scanner_bind_addr: addr,
            ..RelayConfig::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));

        tokio::spawn(run_scanner_listener(config, tx, Arc::clone(&running)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        (addr, rx, running)
    }

    #[tokio::test]
    async fn test_newline_terminated_write_becomes_one_event() {
        // Arrange
        let (addr, mut rx, running) = start_test_listener().await;
        let mut scanner = TcpStream::connect(addr).await.unwrap();

        // Act: the scenario from the wire protocol — "ABC123\n".
        scanner.write_all(b"ABC123\n").await.unwrap();

        // Assert
        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, ScanSource::Tcp);
        assert_eq!(event.payload, "ABC123");

        running.store(false, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_chunked_scan_reassembles_across_writes() {
        let (addr, mut rx, running) = start_test_listener().await;
        let mut scanner = TcpStream::connect(addr).await.unwrap();

        scanner.write_all(b"WIDGET-").await.unwrap();
        scanner.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scanner.write_all(b"99\n").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload, "WIDGET-99");

        running.store(false, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_two_scanners_feed_independently() {
        let (addr, mut rx, running) = start_test_listener().await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        let mut second = TcpStream::connect(addr).await.unwrap();

        // An unterminated prefix on the first scanner must not leak into the
        // second scanner's completed scan.
        first.write_all(b"PARTIAL").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        second.write_all(b"WHOLE\n").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload, "WHOLE");

        running.store(false, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_disconnect_discards_partial_scan() {
        let (addr, mut rx, running) = start_test_listener().await;

        {
            let mut scanner = TcpStream::connect(addr).await.unwrap();
            scanner.write_all(b"NEVER-FINISHED").await.unwrap();
            // Dropping the stream closes the connection mid-scan.
        }

        // The partial scan dies with the connection; a fresh scanner still
        // works and nothing from the dead buffer resurfaces.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut scanner = TcpStream::connect(addr).await.unwrap();
        scanner.write_all(b"FRESH\n").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload, "FRESH");

        running.store(false, Ordering::Relaxed);
    }
}
