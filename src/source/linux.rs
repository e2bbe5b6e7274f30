// Linux-specific helpers: default gateway from /proc/net/route, DNS from /etc/resolv.conf.

use std::net::Ipv4Addr;

/// Default IPv4 gateway of the host (Linux), or None when unavailable.
pub(super) fn read_default_gateway() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/net/route").ok()?;
        parse_default_gateway(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Nameservers listed in /etc/resolv.conf (Linux), in file order.
pub(super) fn read_dns_servers() -> Vec<String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/resolv.conf") {
            return parse_nameservers(&content);
        }
    }
    Vec::new()
}

/// /proc/net/route stores addresses as host-endian hex of the network-order bytes.
#[cfg(any(target_os = "linux", test))]
fn parse_default_gateway(content: &str) -> Option<String> {
    content.lines().skip(1).find_map(|line| {
        let mut fields = line.split_whitespace();
        let _iface = fields.next()?;
        let destination = fields.next()?;
        let gateway = fields.next()?;
        if destination != "00000000" {
            return None;
        }
        let raw = u32::from_str_radix(gateway, 16).ok()?;
        if raw == 0 {
            return None;
        }
        Some(Ipv4Addr::from(raw.to_le_bytes()).to_string())
    })
}

#[cfg(any(target_os = "linux", test))]
fn parse_nameservers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("nameserver"), Some(addr)) => Some(addr.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Dotted-quad mask for an IPv4 prefix length (e.g. 24 -> 255.255.255.0).
pub(super) fn subnet_mask_from_prefix(prefix: u8) -> Ipv4Addr {
    let bits = u32::MAX
        .checked_shl(32u32.saturating_sub(u32::from(prefix)))
        .unwrap_or(0);
    Ipv4Addr::from(bits)
}
