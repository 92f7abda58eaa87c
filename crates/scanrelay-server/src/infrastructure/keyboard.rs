//! Keyboard-wedge adapter: exclusive device grab plus a blocking read loop.
//!
//! # What is a keyboard wedge? (for beginners)
//!
//! Many handheld barcode scanners present themselves to the OS as a USB
//! keyboard: scanning a code "types" its characters followed by Enter.  That
//! is convenient for point-of-sale software but a problem for a relay — the
//! characters would also land in whatever window has focus.
//!
//! The fix is the **exclusive grab**: the `EVIOCGRAB` ioctl asks the kernel
//! to deliver the device's events to this process only.  Once grabbed, the
//! wedge types into the relay and nowhere else.
//!
//! # Read strategy
//!
//! Events are read as fixed-size records with a plain blocking `read` on a
//! dedicated blocking worker (`tokio::task::spawn_blocking`).  A blocking
//! read preserves arrival order exactly like a busy-poll would, without
//! burning a core while the scanner is idle.  Read errors re-arm the loop
//! after a short pause rather than killing the adapter.
//!
//! The worker has no cancellation channel: it parks in `read` until the next
//! event.  On shutdown it either notices the closed dispatch channel at the
//! next record or is reaped with the process — fire-and-forget delivery
//! means there is nothing to flush.
//!
//! # Failure policy
//!
//! Opening the device node needs elevated privileges and the right device
//! path; both are deployment concerns.  If the open or the grab fails the
//! adapter reports the error, the caller logs a warning, and ONLY this
//! adapter stays down — TCP scanners, NFC, and the broadcast layer are
//! unaffected.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use scanrelay_core::rawkey::INPUT_EVENT_SIZE;
use scanrelay_core::{Accumulator, KeyRecord, ScanEvent, ScanSource};

use crate::domain::config::RelayConfig;

/// `EVIOCGRAB` ioctl request number (`_IOW('E', 0x90, int)`).
#[cfg(target_os = "linux")]
const EVIOCGRAB: libc::c_ulong = 0x4004_4590;

/// Pause before re-arming the read loop after a device error.
const REARM_DELAY: Duration = Duration::from_millis(50);

/// Why the keyboard adapter could not start.
#[derive(Debug, Error)]
pub enum KeyboardError {
    /// The device node could not be opened (missing, or insufficient
    /// privileges — the node is normally root-only).
    #[error("failed to open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The exclusive-grab ioctl failed (device already grabbed by another
    /// process, or insufficient privileges).
    #[error("failed to grab input device {path} exclusively")]
    Grab { path: PathBuf },

    /// Raw input device capture only exists on Linux.
    #[error("keyboard capture is not supported on this platform")]
    Unsupported,
}

/// Opens and grabs the configured device, then spawns the blocking read loop.
///
/// Completed scans are sent to the dispatch channel.  Call this once at
/// startup; on `Err`, log and continue without the keyboard adapter.
///
/// # Errors
///
/// [`KeyboardError::Open`] or [`KeyboardError::Grab`] on Linux;
/// [`KeyboardError::Unsupported`] elsewhere.
pub fn start_keyboard_adapter(
    config: &RelayConfig,
    events: mpsc::UnboundedSender<ScanEvent>,
) -> Result<(), KeyboardError> {
    let device = open_and_grab(&config.keyboard_device)?;
    let path = config.keyboard_device.clone();

    info!(
        "keyboard device {} grabbed; wedge events are captured exclusively",
        path.display()
    );

    tokio::task::spawn_blocking(move || read_loop(device, &path, events));
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_and_grab(path: &Path) -> Result<File, KeyboardError> {
    use std::os::unix::io::AsRawFd;

    // The original wedge firmware wants the node opened read/write; reads
    // alone work, but matching the deployed open mode keeps permissions
    // failures identical between environments.
    let device = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| KeyboardError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    // SAFETY: the fd is owned by `device` and stays open for the duration of
    // the call; EVIOCGRAB with arg 1 only flips kernel-side delivery state.
    let rc = unsafe { libc::ioctl(device.as_raw_fd(), EVIOCGRAB as _, 1) };
    if rc != 0 {
        return Err(KeyboardError::Grab {
            path: path.to_path_buf(),
        });
    }

    Ok(device)
}

#[cfg(not(target_os = "linux"))]
fn open_and_grab(_path: &Path) -> Result<File, KeyboardError> {
    Err(KeyboardError::Unsupported)
}

/// The blocking read loop: one fixed-size record per read, forever.
///
/// Runs on a blocking worker thread.  Exits only when the dispatch channel
/// closes (shutdown); read errors re-arm after [`REARM_DELAY`].
fn read_loop(mut device: File, path: &Path, events: mpsc::UnboundedSender<ScanEvent>) {
    let mut accumulator = Accumulator::new(ScanSource::Keyboard);
    let mut record = [0u8; INPUT_EVENT_SIZE];

    loop {
        match device.read_exact(&mut record) {
            Ok(()) => {
                // Truncated/undecodable records return None and are dropped.
                let Some(rec) = KeyRecord::decode(&record) else {
                    continue;
                };

                if let Some(event) = accumulator.feed_key(&rec) {
                    debug!("keyboard scan completed: {:?}", event.payload);
                    if events.send(event).is_err() {
                        debug!("dispatch channel closed; keyboard read loop exiting");
                        return;
                    }
                }
            }
            Err(e) => {
                // EOF or transient device fault: re-arm, matching the
                // always-rescheduled read of the device protocol.  Check the
                // channel first so shutdown is not spun on.
                if events.is_closed() {
                    debug!("dispatch channel closed; keyboard read loop exiting");
                    return;
                }
                warn!("keyboard device {} read error: {e}; re-arming", path.display());
                std::thread::sleep(REARM_DELAY);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn raw_record(event_type: u16, code: u16, value: i32) -> [u8; INPUT_EVENT_SIZE] {
        let mut buf = [0u8; INPUT_EVENT_SIZE];
        buf[16..18].copy_from_slice(&event_type.to_le_bytes());
        buf[18..20].copy_from_slice(&code.to_le_bytes());
        buf[20..24].copy_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_open_missing_device_reports_open_error() {
        // Arrange: a path that cannot exist.
        let config = RelayConfig {
            keyboard_device: PathBuf::from("/nonexistent/input/event99"),
            ..RelayConfig::default()
        };
        let (tx, _rx) = mpsc::unbounded_channel();

        // Act: no runtime needed — the failure happens before spawn_blocking.
        let result = start_keyboard_adapter(&config, tx);

        // Assert: the error names the path; the process is expected to log
        // this and carry on with the other adapters.
        match result {
            Err(KeyboardError::Open { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/input/event99"));
            }
            Err(KeyboardError::Unsupported) => {
                // Non-Linux test host: the adapter disables itself entirely.
            }
            other => panic!("expected Open error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_loop_assembles_scans_from_record_stream() {
        // Arrange: a regular file standing in for the device node, holding
        // the press/release stream for "hi" + Enter.
        let dir = std::env::temp_dir();
        let path = dir.join(format!("scanrelay-kbd-test-{}", std::process::id()));
        {
            let mut f = File::create(&path).unwrap();
            for code in [35u16, 23, 28] {
                f.write_all(&raw_record(1, code, 1)).unwrap(); // press
                f.write_all(&raw_record(1, code, 0)).unwrap(); // release
                f.write_all(&raw_record(0, 0, 0)).unwrap(); // EV_SYN
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let device = File::open(&path).unwrap();
        let loop_path = path.clone();
        let worker = std::thread::spawn(move || read_loop(device, &loop_path, tx));

        // Act / Assert: exactly one completed scan comes out.
        let event = rx.blocking_recv().unwrap();
        assert_eq!(event.source, ScanSource::Keyboard);
        assert_eq!(event.payload, "hi");

        // Closing the receiver ends the loop at its EOF re-arm check.
        drop(rx);
        worker.join().unwrap();
        std::fs::remove_file(&path).unwrap();
    }
}
