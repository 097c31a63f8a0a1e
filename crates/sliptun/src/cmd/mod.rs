use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::info;

use sliptun_bridge::{shutdown_pair, Bridge};
use sliptun_transport::{BaudRate, SerialPort};

use crate::exit::{bridge_error, transport_error, CliResult, SUCCESS};

pub mod client;
pub mod server;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dial a tunnel server and bridge it to the serial line.
    Client(ClientArgs),
    /// Accept one tunnel peer and bridge it to the serial line.
    Server(ServerArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Client(args) => client::run(args),
        Command::Server(args) => server::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Tunnel server address (host:port).
    pub addr: String,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Port to listen on for the single tunnel peer.
    pub port: u16,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Args, Debug)]
pub struct LineArgs {
    /// Serial device path. Without it, /dev/ttyUSB0, /dev/cuaU0 and
    /// /dev/ucom0 are probed in order.
    #[arg(long, short = 's', value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Line speed; must be one of the supported rates.
    #[arg(long, short = 'B', value_name = "RATE", default_value_t = 115200)]
    pub baud: u32,
}

impl LineArgs {
    fn open_serial(&self) -> CliResult<SerialPort> {
        let baud =
            BaudRate::from_u32(self.baud).map_err(|err| transport_error("baud rate", err))?;
        match &self.device {
            Some(path) => SerialPort::open(path, baud),
            None => SerialPort::open_default(baud),
        }
        .map_err(|err| transport_error("serial setup", err))
    }
}

/// Shared tail of both roles: open the serial line, wire up signal-driven
/// shutdown, and run the bridge until it stops.
pub(crate) fn run_bridge<N>(tunnel: N, line: &LineArgs) -> CliResult<i32>
where
    N: Read + Write + AsRawFd,
{
    let serial = line.open_serial()?;

    let (mut shutdown, trigger) =
        shutdown_pair().map_err(|err| bridge_error("shutdown setup", err))?;
    trigger
        .install_ctrlc()
        .map_err(|err| bridge_error("signal setup", err))?;

    let mut bridge = Bridge::new(serial, tunnel);
    bridge
        .queue_line_flush()
        .map_err(|err| bridge_error("line flush", err))?;

    bridge.run(&mut shutdown).map_err(|err| bridge_error("bridge", err))?;

    info!("shutting down");
    Ok(SUCCESS)
}
