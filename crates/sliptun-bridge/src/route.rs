use tracing::info;

use sliptun_codec::{Frame, FrameClass};

/// Consumer for frames that carry line diagnostics rather than tunnel
/// payload.
///
/// The embedded device shares its serial line between tunnel traffic and
/// diagnostic conventions (command request/response, debug text). Those
/// frames terminate here and never reach the tunnel.
pub trait DiagnosticSink {
    fn command_response(&mut self, frame: &[u8]);
    fn command_request(&mut self, frame: &[u8]);
    fn debug_line(&mut self, text: &[u8]);
}

/// Default sink: emits diagnostics through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn command_response(&mut self, frame: &[u8]) {
        info!(payload = %String::from_utf8_lossy(frame), "command response received");
    }

    fn command_request(&mut self, frame: &[u8]) {
        info!(payload = %String::from_utf8_lossy(frame), "command request received");
    }

    fn debug_line(&mut self, text: &[u8]) {
        info!(line = %String::from_utf8_lossy(text), "device debug");
    }
}

/// Route one decoded frame.
///
/// Diagnostic frames go to the sink and yield `None`; payload frames are
/// returned for forwarding to the tunnel. Debug lines are handed over
/// without their leading marker byte.
pub fn route<'a>(frame: &'a Frame, sink: &mut dyn DiagnosticSink) -> Option<&'a [u8]> {
    match frame.class() {
        FrameClass::CommandResponse => {
            sink.command_response(frame.payload());
            None
        }
        FrameClass::CommandRequest => {
            sink.command_request(frame.payload());
            None
        }
        FrameClass::DebugLine => {
            sink.debug_line(&frame.payload()[1..]);
            None
        }
        FrameClass::Payload => Some(frame.payload()),
    }
}
