use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Logs "still generating plot" at a fixed interval until dropped.
///
/// Dropping the guard closes the channel, which wakes the background thread immediately; the
/// thread is then joined.
#[derive(Debug)]
pub struct Heartbeat {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    pub fn start(name: &str, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let name = name.to_owned();
        let spawned = std::thread::Builder::new()
            .name("plotsmith-heartbeat".to_owned())
            .spawn(move || {
                let start = Instant::now();
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            tracing::info!(
                                name = %name,
                                elapsed = start.elapsed().as_secs(),
                                "still generating plot"
                            );
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            });

        match spawned {
            Ok(handle) => Self {
                stop: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                tracing::warn!("failed to start heartbeat thread: {e}");
                Self {
                    stop: None,
                    handle: None,
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
