// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Protocol tag the converter writes for ICMP flows, whose `dst` has no port.
pub const ICMP: &str = "ICMP";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("destination '{0}' has no port separator")]
    MissingPort(String),
    #[error("destination '{dst}' has an invalid port '{port}'")]
    InvalidPort { dst: String, port: String },
}

/// A flow destination split into the host part and the optional port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub host: String,
    pub port: Option<u16>,
}

/// Splits a flow's `dst` field into host and port.
///
/// ICMP destinations are taken verbatim. Everything else is split on the
/// *last* colon, so `2001:db8::1:443` yields host `2001:db8::1` and port 443.
pub fn parse_destination(dst: &str, protocol: &str) -> Result<Destination, DestinationError> {
    if protocol == ICMP {
        return Ok(Destination {
            host: dst.to_string(),
            port: None,
        });
    }

    let Some((host, port)) = dst.rsplit_once(':') else {
        return Err(DestinationError::MissingPort(dst.to_string()));
    };

    let port: u16 = port.parse().map_err(|_| DestinationError::InvalidPort {
        dst: dst.to_string(),
        port: port.to_string(),
    })?;

    Ok(Destination {
        host: host.to_string(),
        port: Some(port),
    })
}

/// Returns `true` if `host` is a literal IP address that never leaves the
/// local network. Hostnames always return `false`.
pub fn is_private_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok_and(|ip| is_private(&ip))
}

/// Addresses that are not globally reachable: RFC 1918 and ULA space,
/// loopback, link-local, documentation, benchmarking and reserved ranges.
pub fn is_private(ip_addr: &IpAddr) -> bool {
    match ip_addr {
        IpAddr::V4(ipv4) => is_private_v4(ipv4),
        IpAddr::V6(ipv6) => match ipv6.to_ipv4_mapped() {
            Some(mapped) => is_private_v4(&mapped),
            None => is_private_v6(ipv6),
        },
    }
}

fn is_private_v4(ipv4: &Ipv4Addr) -> bool {
    ipv4.is_private()
        || ipv4.is_loopback()
        || ipv4.is_link_local()
        || ipv4.is_unspecified()
        || ipv4.is_documentation()
        || ipv4.is_broadcast()
        || is_reserved_v4(ipv4)
}

/// `0.0.0.0/8`, `192.0.0.0/24` (minus the anycast `.9` and `.10`),
/// `198.18.0.0/15` and `240.0.0.0/4`.
fn is_reserved_v4(ipv4: &Ipv4Addr) -> bool {
    match ipv4.octets() {
        [0, ..] => true,
        [192, 0, 0, last] => last != 9 && last != 10,
        [198, 18 | 19, ..] => true,
        [first, ..] => first >= 240,
    }
}

fn is_private_v6(ipv6: &Ipv6Addr) -> bool {
    ipv6.is_loopback()
        || ipv6.is_unspecified()
        || ipv6.is_unique_local()
        || ipv6.is_unicast_link_local()
        || is_documentation_v6(ipv6)
        || is_discard_only_v6(ipv6)
        || is_ietf_protocol_v6(ipv6)
}

/// `100::/64`
fn is_discard_only_v6(ipv6: &Ipv6Addr) -> bool {
    matches!(ipv6.segments(), [0x0100, 0, 0, 0, ..])
}

/// `2001::/23`, except the blocks assigned for global use inside it
/// (`2001:1::1`, `2001:1::2`, `2001:3::/32`, `2001:4:112::/48`,
/// `2001:20::/28`, `2001:30::/28`).
fn is_ietf_protocol_v6(ipv6: &Ipv6Addr) -> bool {
    let seg = ipv6.segments();
    if seg[0] != 0x2001 || seg[1] >= 0x0200 {
        return false;
    }
    let anycast = seg[1] == 0x0001 && seg[2..7] == [0; 5] && matches!(seg[7], 1 | 2);
    let global = seg[1] == 0x0003
        || (seg[1] == 0x0004 && seg[2] == 0x0112)
        || (0x0020..=0x003f).contains(&seg[1]);
    !(anycast || global)
}

fn is_documentation_v6(ipv6: &Ipv6Addr) -> bool {
    let segments = ipv6.segments();
    segments[0] == 0x2001 && segments[1] == 0x0db8
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
