//! ext - packing of the extension header containers this stack understands
//!
//! The header codec in `pdu` treats every container as opaque octets; this
//! module interprets the NR RAN Container (TS38.425) and the PDU Session
//! Container (TS38.415).  Anything else is passed through undecoded so that
//! new extension types from the network do not break the tunnel.

use crate::pdu::{ExtensionHeader, GTPU_EXT_NR_RAN_CONTAINER, GTPU_EXT_PDU_SESSION_CONTAINER};
use crate::GtpuError;

const SN_24_BIT_MAX: u32 = 0x00ff_ffff;

/// NR RAN Container, PDU Type 0 "DL User Data" - TS38.425, 5.5.2.1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NrUserData {
    /// 24-bit NR-U sequence number assigned by the sending node
    pub nru_sequence_number: u32,
    pub report_polling: bool,
    pub retransmission: bool,
    pub assistance_info_report_polling: bool,
}

/// NR RAN Container, PDU Type 1 "DL Data Delivery Status" - TS38.425, 5.5.2.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub desired_buffer_size: u32,
    /// 24-bit NR PDCP SN, present when the corresponding indication bit is set
    pub highest_delivered_nr_pdcp_sn: Option<u32>,
    pub highest_transmitted_nr_pdcp_sn: Option<u32>,
    pub final_frame: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NrRanContainer {
    UserData(NrUserData),
    DeliveryStatus(DeliveryStatus),
}

/// PDU Session Container - TS38.415, 5.5.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PduSessionInfo {
    /// DL PDU Session Information (PDU Type 0)
    Downlink { qfi: u8, rqi: bool },
    /// UL PDU Session Information (PDU Type 1)
    Uplink { qfi: u8 },
}

/// An extension header after interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedExtension {
    NrRanContainer(NrRanContainer),
    PduSessionInfo(PduSessionInfo),
    Unknown { ext_type: u8, container: Vec<u8> },
}

/// Interpret one link of the chain.  Unknown types are kept opaque; a known
/// type that fails to unpack is an error and drops the SDU.
pub fn decode_extension(ext: &ExtensionHeader) -> Result<DecodedExtension, GtpuError> {
    match ext.ext_type {
        GTPU_EXT_NR_RAN_CONTAINER => Ok(DecodedExtension::NrRanContainer(
            unpack_nr_ran_container(&ext.container)?,
        )),
        GTPU_EXT_PDU_SESSION_CONTAINER => Ok(DecodedExtension::PduSessionInfo(
            unpack_pdu_session_info(&ext.container)?,
        )),
        _ => Ok(DecodedExtension::Unknown {
            ext_type: ext.ext_type,
            container: ext.container.clone(),
        }),
    }
}

fn malformed(ext_type: u8, reason: &'static str) -> GtpuError {
    GtpuError::MalformedExtension { ext_type, reason }
}

/// Pad a container so that length octet + content + next-type octet fill a
/// whole number of 4-octet words, as TS38.425 frames require.
fn pad_container(mut buf: Vec<u8>) -> Vec<u8> {
    let words = (buf.len() + 2).div_ceil(4);
    buf.resize(words * 4 - 2, 0);
    buf
}

pub fn pack_nr_ran_container(container: &NrRanContainer) -> Result<Vec<u8>, GtpuError> {
    let mut buf = Vec::with_capacity(10);
    match container {
        NrRanContainer::UserData(ud) => {
            if ud.nru_sequence_number > SN_24_BIT_MAX {
                return Err(malformed(
                    GTPU_EXT_NR_RAN_CONTAINER,
                    "NR-U sequence number exceeds 24 bits",
                ));
            }
            // PDU type 0; spare; discard blocks; flush; report polling
            #[allow(clippy::unusual_byte_groupings)]
            buf.push(0b0000_0_0_0_0 | ud.report_polling as u8);
            // spare; req out of seq; report delivered; user data existence;
            // assistance info report polling; retransmission
            #[allow(clippy::unusual_byte_groupings)]
            buf.push((ud.assistance_info_report_polling as u8) << 1 | ud.retransmission as u8);
            buf.extend_from_slice(&ud.nru_sequence_number.to_be_bytes()[1..]);
        }
        NrRanContainer::DeliveryStatus(ds) => {
            for sn in [
                ds.highest_delivered_nr_pdcp_sn,
                ds.highest_transmitted_nr_pdcp_sn,
            ]
            .into_iter()
            .flatten()
            {
                if sn > SN_24_BIT_MAX {
                    return Err(malformed(
                        GTPU_EXT_NR_RAN_CONTAINER,
                        "NR PDCP SN exceeds 24 bits",
                    ));
                }
            }
            // PDU type 1; highest tx ind; highest delivered ind; final frame;
            // lost packet report (unsupported, always 0)
            #[allow(clippy::unusual_byte_groupings)]
            buf.push(
                0b0001_0_0_0_0
                    | (ds.highest_transmitted_nr_pdcp_sn.is_some() as u8) << 3
                    | (ds.highest_delivered_nr_pdcp_sn.is_some() as u8) << 2
                    | (ds.final_frame as u8) << 1,
            );
            // spare; delivered retransmitted ind; retransmitted ind; data rate
            // ind; cause report (all unsupported)
            buf.push(0);
            buf.extend_from_slice(&ds.desired_buffer_size.to_be_bytes());
            if let Some(sn) = ds.highest_delivered_nr_pdcp_sn {
                buf.extend_from_slice(&sn.to_be_bytes()[1..]);
            }
            if let Some(sn) = ds.highest_transmitted_nr_pdcp_sn {
                buf.extend_from_slice(&sn.to_be_bytes()[1..]);
            }
        }
    }
    Ok(pad_container(buf))
}

pub fn unpack_nr_ran_container(data: &[u8]) -> Result<NrRanContainer, GtpuError> {
    let et = GTPU_EXT_NR_RAN_CONTAINER;
    if data.len() < 2 {
        return Err(malformed(et, "too short"));
    }
    match data[0] >> 4 {
        0 => {
            if data.len() < 5 {
                return Err(malformed(et, "DL user data too short"));
            }
            if data[0] & 0b0110 != 0 {
                return Err(malformed(et, "discard blocks / flush not supported"));
            }
            Ok(NrRanContainer::UserData(NrUserData {
                nru_sequence_number: u32::from_be_bytes([0, data[2], data[3], data[4]]),
                report_polling: data[0] & 0b0001 != 0,
                retransmission: data[1] & 0b0000_0001 != 0,
                assistance_info_report_polling: data[1] & 0b0000_0010 != 0,
            }))
        }
        1 => {
            if data[0] & 0b0001 != 0 {
                return Err(malformed(et, "lost packet report not supported"));
            }
            if data[1] != 0 {
                return Err(malformed(et, "unsupported delivery status fields"));
            }
            if data.len() < 6 {
                return Err(malformed(et, "delivery status too short"));
            }
            let desired_buffer_size =
                u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
            let mut offset = 6;
            let mut read_sn = |present: bool| -> Result<Option<u32>, GtpuError> {
                if !present {
                    return Ok(None);
                }
                if data.len() < offset + 3 {
                    return Err(malformed(et, "delivery status too short"));
                }
                let sn =
                    u32::from_be_bytes([0, data[offset], data[offset + 1], data[offset + 2]]);
                offset += 3;
                Ok(Some(sn))
            };
            let highest_delivered_nr_pdcp_sn = read_sn(data[0] & 0b0100 != 0)?;
            let highest_transmitted_nr_pdcp_sn = read_sn(data[0] & 0b1000 != 0)?;
            Ok(NrRanContainer::DeliveryStatus(DeliveryStatus {
                desired_buffer_size,
                highest_delivered_nr_pdcp_sn,
                highest_transmitted_nr_pdcp_sn,
                final_frame: data[0] & 0b0010 != 0,
            }))
        }
        _ => Err(malformed(et, "unknown PDU type")),
    }
}

pub fn pack_pdu_session_info(info: &PduSessionInfo) -> Result<Vec<u8>, GtpuError> {
    let buf = match info {
        PduSessionInfo::Downlink { qfi, rqi } => {
            if *qfi > 0x3f {
                return Err(malformed(
                    GTPU_EXT_PDU_SESSION_CONTAINER,
                    "QFI exceeds 6 bits",
                ));
            }
            // PDU type 0; QMP; SNP; spare | PPP; RQI; QFI
            vec![0b0000_0000, (*rqi as u8) << 6 | qfi]
        }
        PduSessionInfo::Uplink { qfi } => {
            if *qfi > 0x3f {
                return Err(malformed(
                    GTPU_EXT_PDU_SESSION_CONTAINER,
                    "QFI exceeds 6 bits",
                ));
            }
            // PDU type 1; QMP; DL delay ind; UL delay ind; SNP | spare; QFI
            vec![0b0001_0000, *qfi]
        }
    };
    Ok(buf)
}

pub fn unpack_pdu_session_info(data: &[u8]) -> Result<PduSessionInfo, GtpuError> {
    let et = GTPU_EXT_PDU_SESSION_CONTAINER;
    if data.len() < 2 {
        return Err(malformed(et, "too short"));
    }
    match data[0] >> 4 {
        0 => Ok(PduSessionInfo::Downlink {
            qfi: data[1] & 0x3f,
            rqi: data[1] & 0x40 != 0,
        }),
        1 => Ok(PduSessionInfo::Uplink { qfi: data[1] & 0x3f }),
        _ => Err(malformed(et, "unknown PDU type")),
    }
}
