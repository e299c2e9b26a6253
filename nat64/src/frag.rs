// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Fragmentation metadata and the checks a fragment must pass before it is translated.

use net::buffer::{ByteAccess, OutOfBounds};

/// Largest datagram a fragment may be part of.
pub const MAX_DATAGRAM_LEN: u32 = 65535;

/// IPv4 "more fragments" flag, in the flags/offset word.
const IPV4_MF: u16 = 0x2000;
/// IPv4 fragment offset mask, in the flags/offset word.
const IPV4_OFFSET_MASK: u16 = 0x1fff;
/// IPv6 "more fragments" flag, in the offset/flags word of the fragment header.
const IPV6_M: u16 = 0x0001;

/// Reasons for refusing a fragment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    /// ICMP messages are never translated when fragmented
    #[error("fragmented icmp message")]
    Icmp,
    /// Offset is not a multiple of 8
    #[error("offset {0} is not a multiple of 8")]
    Misaligned(u32),
    /// A fragment which is not the last one has a size which is not a multiple of 8
    #[error("non-final fragment size {0} is not a multiple of 8")]
    Size(u32),
    /// Fragment is shorter than 8 bytes
    #[error("fragment size {0} is below 8")]
    TooShort(u32),
    /// Fragment overruns the datagram
    #[error("fragment ends at {end}, beyond {total}")]
    Overflow {
        /// end of the fragment in the datagram
        end: u32,
        /// size of the datagram
        total: u32,
    },
}

/// Check that a fragment may be translated.
///
/// `offset` and `size` are in bytes. The rules are applied in order and the first one failing
/// is reported.
///
/// # Errors
///
/// Returns the [`FragmentError`] of the first violated rule.
pub fn validate(
    offset: u32,
    size: u32,
    total: u32,
    more: bool,
    is_icmp: bool,
) -> Result<(), FragmentError> {
    if is_icmp {
        return Err(FragmentError::Icmp);
    }
    if offset % 8 != 0 {
        return Err(FragmentError::Misaligned(offset));
    }
    if more && size % 8 != 0 {
        return Err(FragmentError::Size(size));
    }
    if size < 8 {
        return Err(FragmentError::TooShort(size));
    }
    let end = offset.saturating_add(size);
    if end > total {
        return Err(FragmentError::Overflow { end, total });
    }
    Ok(())
}

/// Fragmentation state of a packet, from either IP version.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FragmentDescriptor {
    /// The packet is (part of) a fragmented datagram
    pub fragmented: bool,
    /// Offset in 8-byte units
    pub offset_units: u16,
    /// More fragments follow
    pub more: bool,
    /// Identification, zero-extended for IPv4
    pub id: u32,
}

impl FragmentDescriptor {
    /// Decode the IPv4 flags/fragment offset word.
    #[must_use]
    pub fn from_ipv4(flags_offset: u16, id: u16) -> Self {
        let offset_units = flags_offset & IPV4_OFFSET_MASK;
        let more = flags_offset & IPV4_MF != 0;
        Self {
            fragmented: more || offset_units != 0,
            offset_units,
            more,
            id: u32::from(id),
        }
    }

    /// Decode the 8-byte IPv6 fragment extension header found at `offset`.
    ///
    /// An atomic fragment (offset 0, no more fragments) still counts as fragmented.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the header does not fit.
    pub fn from_ipv6_ext(data: &[u8], offset: usize) -> Result<Self, OutOfBounds> {
        let word = data.read_u16_at(offset + 2)?;
        let id = data.read_u32_at(offset + 4)?;
        Ok(Self {
            fragmented: true,
            offset_units: word >> 3,
            more: word & IPV6_M != 0,
            id,
        })
    }

    #[must_use]
    pub fn is_fragmented(&self) -> bool {
        self.fragmented
    }

    /// True unless this is a fragment other than the first one.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.offset_units == 0
    }

    /// True if the transport header is complete in this packet.
    #[must_use]
    pub fn is_whole(&self) -> bool {
        !self.fragmented || (self.offset_units == 0 && !self.more)
    }

    #[must_use]
    pub fn offset_bytes(&self) -> u32 {
        u32::from(self.offset_units) * 8
    }

    /// The IPv4 flags/fragment offset word. DF is never set.
    #[must_use]
    pub fn ipv4_frag_field(&self) -> u16 {
        let mf = if self.more { IPV4_MF } else { 0 };
        (self.offset_units & IPV4_OFFSET_MASK) | mf
    }

    /// The offset/flags word of an IPv6 fragment header.
    #[must_use]
    pub fn ipv6_frag_field(&self) -> u16 {
        let m = if self.more { IPV6_M } else { 0 };
        (self.offset_units << 3) | m
    }

    /// Validate this fragment, `size` being the length of its payload.
    ///
    /// # Errors
    ///
    /// See [`validate`].
    pub fn validate(&self, size: u32, is_icmp: bool) -> Result<(), FragmentError> {
        validate(
            self.offset_bytes(),
            size,
            MAX_DATAGRAM_LEN,
            self.more,
            is_icmp,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(validate(100, 3, 10, true, true), Err(FragmentError::Icmp));
        assert_eq!(
            validate(100, 3, 10, true, false),
            Err(FragmentError::Misaligned(100))
        );
        assert_eq!(validate(96, 3, 10, true, false), Err(FragmentError::Size(3)));
        assert_eq!(
            validate(96, 3, 10, false, false),
            Err(FragmentError::TooShort(3))
        );
        assert_eq!(
            validate(96, 16, 100, false, false),
            Err(FragmentError::Overflow {
                end: 112,
                total: 100
            })
        );
        assert_eq!(validate(96, 13, 109, false, false), Ok(()));
    }

    #[test]
    fn validator_invariant() {
        bolero::check!()
            .with_type::<(u16, u16, u16, bool, bool)>()
            .for_each(|&(offset, size, total, more, is_icmp)| {
                let (offset, size, total) = (u32::from(offset), u32::from(size), u32::from(total));
                let expected = offset % 8 == 0
                    && (!more || size % 8 == 0)
                    && size >= 8
                    && offset + size <= total
                    && !is_icmp;
                assert_eq!(
                    validate(offset, size, total, more, is_icmp).is_ok(),
                    expected
                );
            });
    }

    #[test]
    fn ipv4_descriptor() {
        let unfragmented = FragmentDescriptor::from_ipv4(0x4000, 7);
        assert!(!unfragmented.is_fragmented());
        assert!(unfragmented.is_whole());

        let first = FragmentDescriptor::from_ipv4(0x2000, 7);
        assert!(first.is_fragmented() && first.is_first() && !first.is_whole());
        assert_eq!(first.ipv6_frag_field(), 0x0001);

        let last = FragmentDescriptor::from_ipv4(0x00b9, 7);
        assert!(last.is_fragmented() && !last.is_first());
        assert_eq!(last.offset_bytes(), 0xb9 * 8);
        assert_eq!(last.ipv4_frag_field(), 0x00b9);
        assert_eq!(last.ipv6_frag_field(), 0xb9 << 3);
        assert_eq!(last.id, 7);
    }

    #[test]
    fn ipv6_descriptor() {
        // next header, reserved, offset 185 with M set, id
        let header = [17u8, 0, 0x05, 0xc9, 0xde, 0xad, 0xbe, 0xef];
        let frag = FragmentDescriptor::from_ipv6_ext(&header, 0).unwrap();
        assert!(frag.is_fragmented());
        assert_eq!(frag.offset_units, 185);
        assert!(frag.more);
        assert_eq!(frag.id, 0xdead_beef);
        assert_eq!(frag.ipv4_frag_field(), 0x2000 | 185);
        assert!(FragmentDescriptor::from_ipv6_ext(&header, 1).is_err());

        let atomic = FragmentDescriptor::from_ipv6_ext(&[6, 0, 0, 0, 0, 0, 0, 1], 0).unwrap();
        assert!(atomic.is_fragmented() && atomic.is_whole());
    }

    #[test]
    fn non_first_fragments_fit_in_a_datagram() {
        let frag = FragmentDescriptor::from_ipv4(0x0100, 1);
        assert_eq!(frag.validate(512, false), Ok(()));
        assert_eq!(frag.validate(512, true), Err(FragmentError::Icmp));
        let past_end = FragmentDescriptor::from_ipv4(0x1fff, 1);
        assert!(matches!(
            past_end.validate(64, false),
            Err(FragmentError::Overflow { .. })
        ));
    }
}
