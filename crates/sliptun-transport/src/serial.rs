use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default device names probed when no path is given (linux, fbsd6, fbsd5).
pub const DEFAULT_DEVICES: [&str; 3] = ["ttyUSB0", "cuaU0", "ucom0"];

/// Supported line speeds. Anything outside this set is a setup error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B921600,
}

impl BaudRate {
    pub const DEFAULT: BaudRate = BaudRate::B115200;

    pub fn from_u32(rate: u32) -> Result<Self> {
        match rate {
            9600 => Ok(BaudRate::B9600),
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            57600 => Ok(BaudRate::B57600),
            115200 => Ok(BaudRate::B115200),
            230400 => Ok(BaudRate::B230400),
            460800 => Ok(BaudRate::B460800),
            921600 => Ok(BaudRate::B921600),
            other => Err(TransportError::UnsupportedBaud(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
            BaudRate::B230400 => 230400,
            BaudRate::B460800 => 460800,
            BaudRate::B921600 => 921600,
        }
    }

    fn as_speed(self) -> libc::speed_t {
        match self {
            BaudRate::B9600 => libc::B9600,
            BaudRate::B19200 => libc::B19200,
            BaudRate::B38400 => libc::B38400,
            BaudRate::B57600 => libc::B57600,
            BaudRate::B115200 => libc::B115200,
            BaudRate::B230400 => libc::B230400,
            BaudRate::B460800 => libc::B460800,
            BaudRate::B921600 => libc::B921600,
        }
    }
}

/// A raw-mode, non-blocking serial character device.
///
/// The descriptor is closed when the port is dropped.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open `path` and configure it for SLIP traffic: raw mode, no flow
    /// control, non-blocking reads, DTR raised.
    pub fn open(path: impl AsRef<Path>, baud: BaudRate) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        configure_raw(file.as_raw_fd(), baud).map_err(|source| TransportError::Configure {
            path: path.clone(),
            source,
        })?;

        info!(?path, baud = baud.as_u32(), "serial port opened");
        Ok(Self { file, path })
    }

    /// Probe the default device list under `/dev` and open the first that
    /// works.
    pub fn open_default(baud: BaudRate) -> Result<Self> {
        for name in DEFAULT_DEVICES {
            let path = Path::new("/dev").join(name);
            match Self::open(&path, baud) {
                Ok(port) => return Ok(port),
                Err(err) => debug!(?path, %err, "default device unavailable"),
            }
        }
        Err(TransportError::NoDevice)
    }

    /// The device path this port was opened against.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl AsRawFd for SerialPort {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort").field("path", &self.path).finish()
    }
}

/// Raw-mode termios setup: no line editing, no signal characters, no
/// hardware or software flow control, zero VMIN/VTIME so reads never block.
fn configure_raw(fd: RawFd, baud: BaudRate) -> std::io::Result<()> {
    // SAFETY: `fd` is an open descriptor owned by the caller and `tty` is a
    // valid termios out-parameter for the whole block.
    unsafe {
        if libc::tcflush(fd, libc::TCIOFLUSH) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        let mut tty: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tty) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        libc::cfmakeraw(&mut tty);

        tty.c_cc[libc::VTIME] = 0;
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cflag &= !libc::CRTSCTS;
        tty.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        tty.c_cflag &= !libc::HUPCL;
        tty.c_cflag &= !libc::CLOCAL;

        libc::cfsetispeed(&mut tty, baud.as_speed());
        libc::cfsetospeed(&mut tty, baud.as_speed());

        tty.c_cflag |= libc::CLOCAL;
        if libc::tcsetattr(fd, libc::TCSAFLUSH, &tty) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        let mut dtr: libc::c_int = libc::TIOCM_DTR;
        if libc::ioctl(fd, libc::TIOCMBIS, &mut dtr) == -1 {
            return Err(std::io::Error::last_os_error());
        }
    }

    // Let the hardware settle, then drop anything buffered meanwhile.
    std::thread::sleep(Duration::from_millis(10));

    // SAFETY: `fd` is still the caller's open descriptor.
    unsafe {
        if libc::tcflush(fd, libc::TCIOFLUSH) == -1 {
            return Err(std::io::Error::last_os_error());
        }
    }

    Ok(())
}
