use std::io::{Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{BridgeError, Result};

/// Receiving half of the shutdown channel, polled by the bridge loop.
///
/// The trigger runs on the signal-handling thread, so a flag alone is not
/// enough: the loop may be parked inside the readiness wait. A socketpair
/// wake byte makes the wait return; the flag carries the actual decision.
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    wake_rx: UnixStream,
}

/// Sending half: trips the flag and wakes the loop. Cheap to clone into a
/// signal handler.
#[derive(Clone)]
pub struct ShutdownTrigger {
    flag: Arc<AtomicBool>,
    wake_tx: Arc<UnixStream>,
}

/// Create a connected signal/trigger pair.
pub fn shutdown_pair() -> Result<(ShutdownSignal, ShutdownTrigger)> {
    let (wake_tx, wake_rx) = UnixStream::pair()?;
    wake_rx.set_nonblocking(true)?;
    wake_tx.set_nonblocking(true)?;

    let flag = Arc::new(AtomicBool::new(false));
    let signal = ShutdownSignal {
        flag: Arc::clone(&flag),
        wake_rx,
    };
    let trigger = ShutdownTrigger {
        flag,
        wake_tx: Arc::new(wake_tx),
    };
    Ok((signal, trigger))
}

impl ShutdownTrigger {
    /// Request shutdown and wake the readiness wait.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // A full wake pipe already guarantees the loop will notice.
        let _ = (&*self.wake_tx).write(&[1]);
    }

    /// Route SIGINT/SIGTERM through this trigger.
    pub fn install_ctrlc(&self) -> Result<()> {
        let trigger = self.clone();
        ctrlc::set_handler(move || {
            debug!("termination signal received");
            trigger.trigger();
        })
        .map_err(|err| BridgeError::Signal(err.to_string()))
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Descriptor to register for read-readiness in the poll set.
    pub fn wake_fd(&self) -> RawFd {
        self.wake_rx.as_raw_fd()
    }

    /// Discard queued wake bytes so a level-triggered wait does not spin.
    pub fn drain(&mut self) {
        let mut sink = [0u8; 16];
        while matches!(self.wake_rx.read(&mut sink), Ok(n) if n > 0) {}
    }
}
