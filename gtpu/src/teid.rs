//! teid - GTP-U tunnel endpoint identifier

/// Tunnel endpoint identifier identifying one bearer's tunnel at one
/// endpoint.  Stored in network byte order, as it appears on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GtpTeid(pub [u8; 4]);

impl GtpTeid {
    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl From<u32> for GtpTeid {
    fn from(teid: u32) -> Self {
        GtpTeid(teid.to_be_bytes())
    }
}

impl std::fmt::Display for GtpTeid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x?}", u32::from_be_bytes(self.0))
    }
}
