// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICMP and ICMPv6 message translation, including the packet embedded in error messages.

mod tables;
mod v4_to_v6;
mod v6_to_v4;

pub(crate) use v4_to_v6::icmp4_to_icmp6;
pub(crate) use v6_to_v4::icmp6_to_icmp4;

use crate::checksum::adjust;
use crate::error::TranslateError;
use net::buffer::ByteAccess;

/// Length of the ICMP header, up to the embedded packet of error messages.
pub(crate) const ICMP_HEADER_LEN: usize = 8;

/// Turn the echo message at `offset` into `new_ty`, code 0, without summing its payload.
///
/// `old_pseudo` and `new_pseudo` are the pseudo header sums covered by the checksum before
/// and after the change (zero for ICMPv4, which has none).
fn retype_echo(
    data: &mut [u8],
    offset: usize,
    new_ty: u8,
    old_pseudo: u32,
    new_pseudo: u32,
) -> Result<(), TranslateError> {
    let old_word = data.read_u16_at(offset)?;
    let new_word = u16::from(new_ty) << 8;
    let checksum = data.read_u16_at(offset + 2)?;
    data.write_u16_at(offset, new_word)?;
    data.write_u16_at(
        offset + 2,
        adjust(
            checksum,
            u32::from(old_word) + old_pseudo,
            u32::from(new_word) + new_pseudo,
        ),
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::retype_echo;
    use net::checksum::{finish, fold, raw_sum};

    #[test]
    fn retyped_echo_still_verifies() {
        let pseudo = 0x1_2345;
        let mut data = vec![128u8, 0, 0, 0, 0xbe, 0xef, 0, 1, 1, 2, 3, 4, 5];
        let checksum = finish(raw_sum(&data, pseudo));
        data[2..4].copy_from_slice(&checksum.to_be_bytes());
        retype_echo(&mut data, 0, 8, pseudo, 0).unwrap();
        assert_eq!(data[0], 8);
        assert_eq!(fold(raw_sum(&data, 0)), 0xffff);
        retype_echo(&mut data, 0, 128, 0, pseudo).unwrap();
        assert_eq!(fold(raw_sum(&data, pseudo)), 0xffff);
    }
}
