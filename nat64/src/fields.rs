// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Fixed IPv4 and IPv6 header fields, as read from and written to packet bytes.

use crate::error::TranslateError;
use crate::frag::FragmentDescriptor;
use net::buffer::ByteAccess;
use net::checksum::ipv4_header_checksum;
use net::eth::EthType;
use net::ip::{IPV4_MIN_HEADER_LEN, IPV6_FRAGMENT_HEADER_LEN, IPV6_HEADER_LEN, NextHeader};
use std::net::{Ipv4Addr, Ipv6Addr};

pub(crate) const IPV4_LEN: usize = IPV4_MIN_HEADER_LEN as usize;
pub(crate) const IPV6_LEN: usize = IPV6_HEADER_LEN as usize;
pub(crate) const FRAG_LEN: usize = IPV6_FRAGMENT_HEADER_LEN as usize;

/// Fields of an IPv4 header. Options are not kept.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Ipv4Fields {
    /// Header length in bytes
    pub ihl: usize,
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags_offset: u16,
    pub ttl: u8,
    pub protocol: NextHeader,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl Ipv4Fields {
    pub(crate) fn read(data: &[u8], offset: usize) -> Result<Self, TranslateError> {
        let header: [u8; IPV4_LEN] = data.read_array_at(offset)?;
        if header[0] >> 4 != 4 {
            return Err(TranslateError::MalformedHeader("ip version is not 4"));
        }
        let ihl = usize::from(header[0] & 0x0f) * 4;
        if ihl < IPV4_LEN {
            return Err(TranslateError::MalformedHeader("ipv4 header length below 20"));
        }
        let total_len = u16::from_be_bytes([header[2], header[3]]);
        if usize::from(total_len) < ihl {
            return Err(TranslateError::MalformedHeader(
                "ipv4 total length shorter than its header",
            ));
        }
        Ok(Self {
            ihl,
            tos: header[1],
            total_len,
            id: u16::from_be_bytes([header[4], header[5]]),
            flags_offset: u16::from_be_bytes([header[6], header[7]]),
            ttl: header[8],
            protocol: NextHeader::new(header[9]),
            src: Ipv4Addr::new(header[12], header[13], header[14], header[15]),
            dst: Ipv4Addr::new(header[16], header[17], header[18], header[19]),
        })
    }

    pub(crate) fn frag(&self) -> FragmentDescriptor {
        FragmentDescriptor::from_ipv4(self.flags_offset, self.id)
    }

    /// Length of the payload following the header.
    pub(crate) fn payload_len(&self) -> usize {
        usize::from(self.total_len) - self.ihl
    }

    /// Write an option-less header at `offset`, checksum field zeroed.
    pub(crate) fn write(&self, data: &mut [u8], offset: usize) -> Result<(), TranslateError> {
        let mut header = [0u8; IPV4_LEN];
        header[0] = 0x45;
        header[1] = self.tos;
        header[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        header[4..6].copy_from_slice(&self.id.to_be_bytes());
        header[6..8].copy_from_slice(&self.flags_offset.to_be_bytes());
        header[8] = self.ttl;
        header[9] = self.protocol.as_u8();
        header[12..16].copy_from_slice(&self.src.octets());
        header[16..20].copy_from_slice(&self.dst.octets());
        data.write_at(offset, &header)?;
        Ok(())
    }
}

/// Compute and store the checksum of the option-less IPv4 header at `offset`.
pub(crate) fn write_ipv4_checksum(data: &mut [u8], offset: usize) -> Result<(), TranslateError> {
    let checksum = ipv4_header_checksum(data.slice_at(offset, IPV4_LEN)?);
    data.write_u16_at(offset + 10, checksum)?;
    Ok(())
}

/// Fields of the fixed IPv6 header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Ipv6Fields {
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_len: u16,
    pub next_header: NextHeader,
    pub hop_limit: u8,
    pub src: Ipv6Addr,
    pub dst: Ipv6Addr,
}

impl Ipv6Fields {
    pub(crate) fn read(data: &[u8], offset: usize) -> Result<Self, TranslateError> {
        let header: [u8; IPV6_LEN] = data.read_array_at(offset)?;
        let vtc_flow = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if vtc_flow >> 28 != 6 {
            return Err(TranslateError::MalformedHeader("ip version is not 6"));
        }
        let mut src = [0u8; 16];
        src.copy_from_slice(&header[8..24]);
        let mut dst = [0u8; 16];
        dst.copy_from_slice(&header[24..40]);
        #[allow(clippy::cast_possible_truncation)] // 8-bit field
        let traffic_class = (vtc_flow >> 20) as u8;
        Ok(Self {
            traffic_class,
            flow_label: vtc_flow & 0x000f_ffff,
            payload_len: u16::from_be_bytes([header[4], header[5]]),
            next_header: NextHeader::new(header[6]),
            hop_limit: header[7],
            src: Ipv6Addr::from(src),
            dst: Ipv6Addr::from(dst),
        })
    }

    pub(crate) fn write(&self, data: &mut [u8], offset: usize) -> Result<(), TranslateError> {
        let vtc_flow = (6u32 << 28) | (u32::from(self.traffic_class) << 20) | self.flow_label;
        let mut header = [0u8; IPV6_LEN];
        header[0..4].copy_from_slice(&vtc_flow.to_be_bytes());
        header[4..6].copy_from_slice(&self.payload_len.to_be_bytes());
        header[6] = self.next_header.as_u8();
        header[7] = self.hop_limit;
        header[8..24].copy_from_slice(&self.src.octets());
        header[24..40].copy_from_slice(&self.dst.octets());
        data.write_at(offset, &header)?;
        Ok(())
    }
}

/// Write an IPv6 fragment extension header at `offset`.
pub(crate) fn write_fragment_header(
    data: &mut [u8],
    offset: usize,
    next_header: NextHeader,
    frag: &FragmentDescriptor,
) -> Result<(), TranslateError> {
    let mut header = [0u8; FRAG_LEN];
    header[0] = next_header.as_u8();
    header[2..4].copy_from_slice(&frag.ipv6_frag_field().to_be_bytes());
    header[4..8].copy_from_slice(&frag.id.to_be_bytes());
    data.write_at(offset, &header)?;
    Ok(())
}

/// Rewrite the ethertype announcing the network header at `net_off`.
pub(crate) fn set_ethertype(
    data: &mut [u8],
    net_off: usize,
    ty: EthType,
) -> Result<(), TranslateError> {
    let offset = net_off.checked_sub(2).ok_or(TranslateError::Truncated)?;
    data.write_u16_at(offset, ty.raw())?;
    Ok(())
}

/// The IPv4 address embedded in the low 32 bits of an IPv6 address.
pub(crate) fn embedded_ipv4(addr: &Ipv6Addr) -> Ipv4Addr {
    let o = addr.octets();
    Ipv4Addr::new(o[12], o[13], o[14], o[15])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use etherparse::{Ipv4HeaderSlice, Ipv6HeaderSlice};

    #[test]
    fn ipv4_fields_round_trip_through_etherparse() {
        let fields = Ipv4Fields {
            ihl: 20,
            tos: 0xb8,
            total_len: 48,
            id: 0x1234,
            flags_offset: 0x2001,
            ttl: 17,
            protocol: NextHeader::UDP,
            src: Ipv4Addr::new(192, 0, 2, 1),
            dst: Ipv4Addr::new(198, 51, 100, 7),
        };
        let mut data = vec![0u8; 24];
        fields.write(&mut data, 2).unwrap();
        write_ipv4_checksum(&mut data, 2).unwrap();
        let slice = Ipv4HeaderSlice::from_slice(&data[2..]).unwrap();
        assert_eq!(slice.to_header().calc_header_checksum(), slice.header_checksum());
        assert_eq!(slice.ttl(), 17);
        assert!(slice.more_fragments());
        assert_eq!(Ipv4Fields::read(&data, 2).unwrap(), fields);
        assert!(Ipv4Fields::read(&data, 10).is_err());
    }

    #[test]
    fn ipv4_sanity_checks() {
        let mut data = [0u8; 20];
        data[0] = 0x44;
        data[3] = 20;
        assert!(matches!(
            Ipv4Fields::read(&data, 0),
            Err(TranslateError::MalformedHeader(_))
        ));
        data[0] = 0x65;
        assert!(matches!(
            Ipv4Fields::read(&data, 0),
            Err(TranslateError::MalformedHeader(_))
        ));
        data[0] = 0x46;
        assert!(matches!(
            Ipv4Fields::read(&data, 0),
            Err(TranslateError::MalformedHeader(_))
        ));
        data[0] = 0x45;
        assert!(Ipv4Fields::read(&data, 0).is_ok());
    }

    #[test]
    fn ipv6_fields_round_trip_through_etherparse() {
        let fields = Ipv6Fields {
            traffic_class: 0xb8,
            flow_label: 0xabcde,
            payload_len: 8,
            next_header: NextHeader::FRAGMENT,
            hop_limit: 3,
            src: "2001:db8::1".parse().unwrap(),
            dst: "64:ff9b::c000:201".parse().unwrap(),
        };
        let mut data = vec![0u8; 48];
        fields.write(&mut data, 0).unwrap();
        let frag = FragmentDescriptor::from_ipv4(0x2003, 9);
        write_fragment_header(&mut data, 40, NextHeader::UDP, &frag).unwrap();
        let slice = Ipv6HeaderSlice::from_slice(&data).unwrap();
        assert_eq!(slice.traffic_class(), 0xb8);
        assert_eq!(slice.hop_limit(), 3);
        assert_eq!(Ipv6Fields::read(&data, 0).unwrap(), fields);
        assert_eq!(embedded_ipv4(&fields.dst), Ipv4Addr::new(192, 0, 2, 1));

        let parsed = FragmentDescriptor::from_ipv6_ext(&data, 40).unwrap();
        assert_eq!(parsed.offset_units, 3);
        assert!(parsed.more);
        assert_eq!(parsed.id, 9);
        assert_eq!(data[40], 17);
    }
}
