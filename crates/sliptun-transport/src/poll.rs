use std::os::fd::RawFd;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// Which conditions to watch on a descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

impl Interest {
    pub const READ: Interest = Interest {
        read: true,
        write: false,
    };
    pub const WRITE: Interest = Interest {
        read: false,
        write: true,
    };
}

/// Conditions reported ready after a wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct Readiness {
    pub readable: bool,
    pub writable: bool,
    pub hangup: bool,
}

/// A `poll(2)` readiness set, rebuilt each loop iteration.
///
/// Interest sets change between iterations (write interest depends on
/// pending output, read interest on backpressure), so registrations are
/// cheap and transient: `clear`, `register` each descriptor, `wait`, then
/// inspect `readiness` by token.
#[derive(Debug, Default)]
pub struct PollSet {
    fds: Vec<libc::pollfd>,
}

impl PollSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fds.clear();
    }

    /// Add a descriptor to the set; the returned token indexes `readiness`
    /// after the next `wait`.
    pub fn register(&mut self, fd: RawFd, interest: Interest) -> usize {
        let mut events: libc::c_short = 0;
        if interest.read {
            events |= libc::POLLIN;
        }
        if interest.write {
            events |= libc::POLLOUT;
        }
        self.fds.push(libc::pollfd {
            fd,
            events,
            revents: 0,
        });
        self.fds.len() - 1
    }

    /// Block until at least one watched condition is ready.
    ///
    /// `None` blocks indefinitely. Returns the number of ready descriptors;
    /// zero on timeout or when a signal interrupted the wait (the caller
    /// re-checks its shutdown flag and loops).
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<usize> {
        for pollfd in &mut self.fds {
            pollfd.revents = 0;
        }

        let timeout_ms: libc::c_int =
            timeout.map_or(-1, |t| t.as_millis().min(i32::MAX as u128) as libc::c_int);

        // SAFETY: `fds` is an owned, initialized slice of pollfd and the
        // length passed matches it.
        let ready = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };

        if ready == -1 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(TransportError::Poll(err));
        }

        Ok(ready as usize)
    }

    /// Readiness of the descriptor registered under `token`.
    ///
    /// Hangup and error conditions are folded into `readable` so the caller
    /// observes them through the read path (zero-length read or an error).
    pub fn readiness(&self, token: usize) -> Readiness {
        let revents = self.fds.get(token).map_or(0, |pollfd| pollfd.revents);
        Readiness {
            readable: revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0,
            writable: revents & libc::POLLOUT != 0,
            hangup: revents & (libc::POLLHUP | libc::POLLERR) != 0,
        }
    }
}
