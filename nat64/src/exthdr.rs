// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv6 extension header chain walking

use crate::error::TranslateError;
use crate::frag::{FragmentDescriptor, FragmentError};
use net::buffer::ByteAccess;
use net::ip::{IPV6_FRAGMENT_HEADER_LEN, NextHeader};
use tracing::trace;

/// Most extension headers accepted in a single chain.
pub const MAX_EXTENSION_HEADERS: usize = 8;

/// What is left of an IPv6 extension header chain once walked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtensionChain {
    /// Upper layer protocol found at the end of the chain
    pub next_header: NextHeader,
    /// Fragmentation state, if a fragment header was found
    pub frag: FragmentDescriptor,
    /// Total length of the extension headers
    pub len: usize,
}

#[derive(Default)]
struct Seen {
    hop_by_hop: bool,
    routing: bool,
    fragment: bool,
    dest_opts: u8,
}

/// Walk the extension headers starting at `offset`, `first` being the next-header value of the
/// fixed header.
///
/// `data` must end where the IPv6 payload ends. The walk stops at the first header which is
/// not an extension header.
///
/// # Errors
///
/// Returns an error if the chain breaks ordering or cardinality rules, holds a header which
/// cannot be translated, or runs past the end of `data`.
pub fn walk(
    data: &[u8],
    offset: usize,
    first: NextHeader,
) -> Result<ExtensionChain, TranslateError> {
    let mut next_header = first;
    let mut frag = FragmentDescriptor::default();
    let mut seen = Seen::default();
    let mut cursor = offset;
    let mut count = 0;

    loop {
        let len = match next_header {
            NextHeader::AUTH | NextHeader::ESP => {
                return Err(TranslateError::UnsupportedExtensionHeader(next_header.as_u8()));
            }
            NextHeader::HOP_BY_HOP => {
                if count != 0 || seen.hop_by_hop {
                    return Err(TranslateError::MalformedExtensionHeader(
                        "hop-by-hop options not first",
                    ));
                }
                seen.hop_by_hop = true;
                options_len(data, cursor)?
            }
            NextHeader::DEST_OPTS => {
                if seen.dest_opts == 2 {
                    return Err(TranslateError::MalformedExtensionHeader(
                        "more than two destination options headers",
                    ));
                }
                seen.dest_opts += 1;
                options_len(data, cursor)?
            }
            NextHeader::ROUTING => {
                if seen.routing {
                    return Err(TranslateError::MalformedExtensionHeader(
                        "duplicate routing header",
                    ));
                }
                seen.routing = true;
                if data.read_u8_at(cursor + 2)? == 0 {
                    return Err(TranslateError::UnsupportedExtensionHeader(
                        NextHeader::ROUTING.as_u8(),
                    ));
                }
                options_len(data, cursor)?
            }
            NextHeader::FRAGMENT => {
                if seen.fragment {
                    return Err(TranslateError::MalformedExtensionHeader(
                        "duplicate fragment header",
                    ));
                }
                seen.fragment = true;
                frag = FragmentDescriptor::from_ipv6_ext(data, cursor)?;
                if NextHeader::new(data.read_u8_at(cursor)?) == NextHeader::ICMP6 {
                    return Err(FragmentError::Icmp.into());
                }
                usize::from(IPV6_FRAGMENT_HEADER_LEN)
            }
            _ => break,
        };
        count += 1;
        if count > MAX_EXTENSION_HEADERS {
            return Err(TranslateError::MalformedExtensionHeader(
                "too many extension headers",
            ));
        }
        if cursor + len > data.len() {
            return Err(TranslateError::MalformedExtensionHeader(
                "extension header overruns packet",
            ));
        }
        trace!("extension header {next_header} of {len} bytes at {cursor}");
        next_header = NextHeader::new(data.read_u8_at(cursor)?);
        cursor += len;
    }

    if cursor >= data.len() {
        return Err(TranslateError::Truncated);
    }
    Ok(ExtensionChain {
        next_header,
        frag,
        len: cursor - offset,
    })
}

/// Length of a header using the generic (hdr ext len + 1) * 8 encoding.
fn options_len(data: &[u8], offset: usize) -> Result<usize, TranslateError> {
    Ok((usize::from(data.read_u8_at(offset + 1)?) + 1) * 8)
}
