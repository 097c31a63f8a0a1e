use sliptun_transport::TcpTunnelListener;

use crate::cmd::{run_bridge, ServerArgs};
use crate::exit::{transport_error, CliResult};

pub fn run(args: ServerArgs) -> CliResult<i32> {
    let listener =
        TcpTunnelListener::bind(args.port).map_err(|err| transport_error("tunnel bind", err))?;
    let tunnel = listener
        .accept_one()
        .map_err(|err| transport_error("tunnel accept", err))?;
    run_bridge(tunnel, &args.line)
}
