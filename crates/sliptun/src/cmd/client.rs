use sliptun_transport::TcpTunnel;

use crate::cmd::{run_bridge, ClientArgs};
use crate::exit::{transport_error, CliResult};

pub fn run(args: ClientArgs) -> CliResult<i32> {
    let tunnel =
        TcpTunnel::connect(&args.addr).map_err(|err| transport_error("tunnel connect", err))?;
    run_bridge(tunnel, &args.line)
}
