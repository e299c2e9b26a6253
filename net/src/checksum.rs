// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Internet checksum primitives (RFC 1071).
//!
//! Sums are carried as unfolded `u32` accumulators so that pseudo headers and payload slices can
//! be chained cheaply; [`fold`] and [`finish`] reduce them to the 16-bit field value.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Add the 16-bit big endian words of `data` to `initial`.
///
/// An odd trailing byte is padded with zero, as required by RFC 1071.
#[must_use]
pub fn raw_sum(data: &[u8], initial: u32) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = u64::from(initial);
    for word in &mut chunks {
        sum += u64::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u64::from(u16::from_be_bytes([*last, 0]));
    }
    fold_wide(sum)
}

fn fold_wide(mut sum: u64) -> u32 {
    while sum > u64::from(u32::MAX) {
        sum = (sum & 0xffff_ffff) + (sum >> 32);
    }
    #[allow(clippy::cast_possible_truncation)] // bounded by the loop above
    let sum = sum as u32;
    sum
}

/// Fold a 32-bit accumulator into 16 bits with end-around carry.
#[must_use]
pub fn fold(mut sum: u32) -> u16 {
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    #[allow(clippy::cast_possible_truncation)] // bounded by the loop above
    let folded = sum as u16;
    folded
}

/// Fold and complement an accumulator, producing the value to store in a checksum field.
#[must_use]
pub fn finish(sum: u32) -> u16 {
    !fold(sum)
}

/// Sum of the IPv4 pseudo header used by TCP and UDP.
#[must_use]
pub fn ipv4_pseudo_header_sum(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, len: u16) -> u32 {
    let sum = raw_sum(&src.octets(), 0);
    let sum = raw_sum(&dst.octets(), sum);
    sum + u32::from(protocol) + u32::from(len)
}

/// Sum of the IPv6 pseudo header used by TCP, UDP and ICMPv6 (RFC 8200 section 8.1).
#[must_use]
pub fn ipv6_pseudo_header_sum(src: Ipv6Addr, dst: Ipv6Addr, next_header: u8, len: u32) -> u32 {
    let sum = raw_sum(&src.octets(), 0);
    let sum = raw_sum(&dst.octets(), sum);
    let sum = raw_sum(&len.to_be_bytes(), sum);
    sum + u32::from(next_header)
}

/// Compute the checksum of an IPv4 header.
///
/// The checksum field (bytes 10 and 11) is skipped, so the header need not have it zeroed.
#[must_use]
pub fn ipv4_header_checksum(header: &[u8]) -> u16 {
    let (before, after) = header.split_at(header.len().min(10));
    let sum = raw_sum(before, 0);
    finish(raw_sum(after.get(2..).unwrap_or_default(), sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from RFC 1071 section 3.
    #[test]
    fn rfc1071_example() {
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(fold(raw_sum(&data, 0)), 0xddf2);
    }

    #[test]
    fn odd_length_is_zero_padded() {
        assert_eq!(raw_sum(&[0xab], 0), 0xab00);
        assert_eq!(raw_sum(&[0x01, 0x02, 0x03], 0), 0x0102 + 0x0300);
    }

    #[test]
    fn ipv4_header_checksum_matches_known_header() {
        // 45 00 00 73 00 00 40 00 40 11 [b8 61] c0 a8 00 01 c0 a8 00 c7
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(ipv4_header_checksum(&header), 0xb861);
        let mut with_checksum = header;
        with_checksum[10..12].copy_from_slice(&0xb861u16.to_be_bytes());
        assert_eq!(ipv4_header_checksum(&with_checksum), 0xb861);
        assert_eq!(fold(raw_sum(&with_checksum, 0)), 0xffff);
    }

    #[test]
    fn pseudo_headers_differ_only_by_layout() {
        let v4 = ipv4_pseudo_header_sum(
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(198, 51, 100, 5),
            17,
            8,
        );
        let mapped_src = Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0xc000, 0x0201);
        let mapped_dst = Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0xc633, 0x6405);
        let v6 = ipv6_pseudo_header_sum(mapped_src, mapped_dst, 17, 8);
        // embedding the same addresses after a zero prefix is checksum neutral
        assert_eq!(fold(v4), fold(v6));
    }

    #[test]
    fn stored_checksum_verifies() {
        bolero::check!()
            .with_type::<(Vec<u8>, u32)>()
            .for_each(|(data, seed)| {
                // even length so that the checksum lands on a word boundary
                let mut data = data.clone();
                if data.len() % 2 == 1 {
                    data.pop();
                }
                let seed = seed & 0xffff;
                let checksum = finish(raw_sum(&data, seed));
                data.extend_from_slice(&checksum.to_be_bytes());
                assert_eq!(fold(raw_sum(&data, seed)), 0xffff);
            });
    }
}
