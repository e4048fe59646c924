//! Local network address probe.
//!
//! The host's own IPv4 address is sent to the freshly provisioned peer as
//! informational data (the `IP:` field) so it can call back once online.
//! The probe uses the UDP connect trick: connecting a datagram socket makes
//! the OS pick the outbound interface and local address without sending a
//! single packet.

use std::net::UdpSocket;

use tracing::warn;

/// Address reported when the probe fails; the peer treats it as "unknown".
const FALLBACK_ADDR: &str = "0.0.0.0";

/// Returns the host's primary IPv4 address as a string, or `"0.0.0.0"` when
/// it cannot be determined (no route, no interface). Never fails – the value
/// is informational only.
pub fn local_ipv4() -> String {
    match probe_local_ipv4() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("could not determine local IPv4 address: {e}; reporting {FALLBACK_ADDR}");
            FALLBACK_ADDR.to_string()
        }
    }
}

fn probe_local_ipv4() -> std::io::Result<String> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    // No packets leave the host; connect() only performs the route lookup.
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_local_ipv4_is_always_a_parseable_address() {
        // Works both on networked hosts and in isolated build sandboxes,
        // where the fallback address is returned.
        let addr = local_ipv4();
        assert!(addr.parse::<IpAddr>().is_ok(), "not an IP address: {addr}");
    }
}
