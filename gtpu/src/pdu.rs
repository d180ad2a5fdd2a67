//! pdu - GTP-U header encode/decode per TS29.281, 5.1 and 5.2

use crate::{GtpTeid, GtpuError};

/// The 8 fixed octets at the start of every GTP-U PDU.
pub const GTPU_BASE_HEADER_LEN: usize = 8;

// Message types - TS29.281, table 6.1-1
pub const GTPU_MSG_ECHO_REQUEST: u8 = 1;
pub const GTPU_MSG_ECHO_RESPONSE: u8 = 2;
pub const GTPU_MSG_ERROR_INDICATION: u8 = 26;
pub const GTPU_MSG_SUPPORTED_EXTENSION_HEADERS_NOTIFICATION: u8 = 31;
pub const GTPU_MSG_END_MARKER: u8 = 254;
pub const GTPU_MSG_DATA_PDU: u8 = 255;

// Extension header types - TS29.281, figure 5.2.1-3
pub const GTPU_EXT_NO_MORE: u8 = 0x00;
pub const GTPU_EXT_UDP_PORT: u8 = 0x40;
pub const GTPU_EXT_LONG_PDCP_PDU_NUMBER: u8 = 0x82;
pub const GTPU_EXT_NR_RAN_CONTAINER: u8 = 0x84;
pub const GTPU_EXT_PDU_SESSION_CONTAINER: u8 = 0x85;
pub const GTPU_EXT_PDCP_PDU_NUMBER: u8 = 0xc0;

/// One link of the extension header chain.  The container holds the content
/// octets between the length octet and the next-extension-type octet, so its
/// length on the wire is always 4n-2.  The codec keeps containers opaque;
/// `ext` interprets the ones this stack understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionHeader {
    pub ext_type: u8,
    pub container: Vec<u8>,
}

/// A decoded GTP-U PDU.  The length field is not represented: it is computed
/// on encode and validated on decode, never caller-supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GtpuPdu {
    pub message_type: u8,
    pub teid: GtpTeid,
    pub sequence_number: Option<u16>,
    pub n_pdu_number: Option<u8>,
    pub extensions: Vec<ExtensionHeader>,
    pub payload: Vec<u8>,
}

pub fn encode(pdu: &GtpuPdu) -> Vec<u8> {
    let has_ext = !pdu.extensions.is_empty();
    let has_seq = pdu.sequence_number.is_some();
    let has_npdu = pdu.n_pdu_number.is_some();

    let mut buf = Vec::with_capacity(GTPU_BASE_HEADER_LEN + 4 + pdu.payload.len());

    // version=1, PT=1, R, E, S, PN - TS29.281, 5.1
    #[allow(clippy::unusual_byte_groupings)]
    buf.push(
        0b001_1_0_0_0_0
            | ((has_ext as u8) << 2)
            | ((has_seq as u8) << 1)
            | (has_npdu as u8),
    );
    buf.push(pdu.message_type);
    buf.extend_from_slice(&[0, 0]); // length - filled in at the end
    buf.extend_from_slice(&pdu.teid.0);

    if has_ext || has_seq || has_npdu {
        buf.extend_from_slice(&pdu.sequence_number.unwrap_or(0).to_be_bytes());
        buf.push(pdu.n_pdu_number.unwrap_or(0));
        buf.push(
            pdu.extensions
                .first()
                .map_or(GTPU_EXT_NO_MORE, |e| e.ext_type),
        );
        for (ii, ext) in pdu.extensions.iter().enumerate() {
            // Each link occupies a whole number of 4-octet words:
            // length octet + content + next-type octet, zero padded.
            let words = (ext.container.len() + 2).div_ceil(4);
            // The length octet caps a link at 255 words.  Truncating here
            // would corrupt the chain, so an oversized container is a
            // caller bug and panics in every build.
            assert!(words <= u8::MAX as usize, "oversized extension container");
            buf.push(words as u8);
            buf.extend_from_slice(&ext.container);
            buf.resize(buf.len() + (words * 4 - 2 - ext.container.len()), 0);
            buf.push(
                pdu.extensions
                    .get(ii + 1)
                    .map_or(GTPU_EXT_NO_MORE, |e| e.ext_type),
            );
        }
    }

    buf.extend_from_slice(&pdu.payload);

    // Length counts every octet after the first 8 fixed ones - TS29.281, 5.1
    let length = (buf.len() - GTPU_BASE_HEADER_LEN) as u16;
    buf[2..4].copy_from_slice(&length.to_be_bytes());
    buf
}

pub fn decode(buf: &[u8]) -> Result<GtpuPdu, GtpuError> {
    if buf.len() < GTPU_BASE_HEADER_LEN {
        return Err(GtpuError::MalformedHeader("shorter than fixed header"));
    }
    let flags = buf[0];
    if flags >> 5 != 1 {
        return Err(GtpuError::MalformedHeader("unsupported version"));
    }
    if flags & 0b0001_0000 == 0 {
        return Err(GtpuError::MalformedHeader("protocol type is not GTP"));
    }
    let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    if length != buf.len() - GTPU_BASE_HEADER_LEN {
        return Err(GtpuError::MalformedHeader("length field mismatch"));
    }
    let message_type = buf[1];
    let teid = GtpTeid([buf[4], buf[5], buf[6], buf[7]]);

    let has_ext = flags & 0b100 != 0;
    let has_seq = flags & 0b010 != 0;
    let has_npdu = flags & 0b001 != 0;

    let mut sequence_number = None;
    let mut n_pdu_number = None;
    let mut extensions = Vec::new();
    let mut offset = GTPU_BASE_HEADER_LEN;

    if has_ext || has_seq || has_npdu {
        if buf.len() < offset + 4 {
            return Err(GtpuError::MalformedHeader("truncated optional fields"));
        }
        if has_seq {
            sequence_number = Some(u16::from_be_bytes([buf[8], buf[9]]));
        }
        if has_npdu {
            n_pdu_number = Some(buf[10]);
        }
        let mut next_type = buf[11];
        offset += 4;

        if has_ext {
            // Walk the chain.  Every link consumes at least one 4-octet word,
            // so a hostile PDU cannot make this loop spin without progress.
            while next_type != GTPU_EXT_NO_MORE {
                if offset >= buf.len() {
                    return Err(GtpuError::MalformedExtension {
                        ext_type: next_type,
                        reason: "chain runs past end of PDU",
                    });
                }
                let words = buf[offset] as usize;
                if words == 0 {
                    return Err(GtpuError::MalformedExtension {
                        ext_type: next_type,
                        reason: "zero length",
                    });
                }
                let total = words * 4;
                if offset + total > buf.len() {
                    return Err(GtpuError::MalformedExtension {
                        ext_type: next_type,
                        reason: "truncated",
                    });
                }
                extensions.push(ExtensionHeader {
                    ext_type: next_type,
                    container: buf[offset + 1..offset + total - 1].to_vec(),
                });
                next_type = buf[offset + total - 1];
                offset += total;
            }
        }
    }

    Ok(GtpuPdu {
        message_type,
        teid,
        sequence_number,
        n_pdu_number,
        extensions,
        payload: buf[offset..].to_vec(),
    })
}
