//! capture - best-effort packet trace hook

/// Receives a copy of every PDU a tunnel sends or receives, for offline
/// tracing.  Implementations must be cheap and must never block; a slow
/// capture sink has to do its own buffering or dropping.
pub trait PacketCapture: Send + Sync {
    fn capture(&self, pdu: &[u8]);
}

/// Capture disabled.
pub struct NoCapture;

impl PacketCapture for NoCapture {
    fn capture(&self, _pdu: &[u8]) {}
}
