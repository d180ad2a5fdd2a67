//! error - per-packet error taxonomy

use crate::GtpTeid;
use thiserror::Error;

/// Errors raised while processing a single PDU or SDU.  All of these are
/// non-fatal: the unit of data is dropped and counted, the tunnel carries on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GtpuError {
    #[error("malformed GTP-U header: {0}")]
    MalformedHeader(&'static str),

    #[error("malformed extension header type={ext_type:#04x}: {reason}")]
    MalformedExtension { ext_type: u8, reason: &'static str },

    #[error("unknown TEID {0}")]
    UnknownTeid(GtpTeid),

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("duplicate or late sequence number {0}")]
    DuplicateOrLateSequence(u16),
}
