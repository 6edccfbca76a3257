//! Network-settings probe: gateway, DNS server, and a derived DHCP range.
//!
//! Used only to seed settings-store defaults; every value can be overridden
//! there afterwards.

use std::net::Ipv4Addr;
use tracing::warn;

const FALLBACK_GATEWAY: &str = "192.168.1.1";

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    pub default_gateway: String,
    pub dns_server: String,
    pub ip_range_start: String,
    pub ip_range_end: String,
}

/// Parse the default gateway out of `/proc/net/route` content: the entry
/// with an all-zero destination and the RTF_GATEWAY flag set. The gateway
/// column is little-endian hex.
fn parse_route_table(contents: &str) -> Option<String> {
    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        let Ok(flags) = u32::from_str_radix(fields[3], 16) else {
            continue;
        };
        if fields[1] != "00000000" || flags & 0x2 == 0 {
            continue;
        }
        let Ok(raw) = u32::from_str_radix(fields[2], 16) else {
            continue;
        };
        return Some(Ipv4Addr::from(raw.to_le_bytes()).to_string());
    }
    None
}

/// First `nameserver` entry from resolv.conf content.
fn parse_resolv_conf(contents: &str) -> Option<String> {
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() == Some("nameserver") {
            if let Some(addr) = parts.next() {
                return Some(addr.to_string());
            }
        }
    }
    None
}

/// DHCP range derived from the gateway's /24: `.100` through `.200`.
fn derive_range(gateway: &str) -> (String, String) {
    match gateway.rsplit_once('.') {
        Some((prefix, _)) => (format!("{}.100", prefix), format!("{}.200", prefix)),
        None => ("192.168.1.100".to_string(), "192.168.1.200".to_string()),
    }
}

/// Probe the local network. Any individual failure falls back to a sane
/// default rather than erroring; the result is only used for first-run
/// defaults.
pub async fn probe() -> NetworkParameters {
    let default_gateway = match tokio::fs::read_to_string("/proc/net/route").await {
        Ok(contents) => parse_route_table(&contents).unwrap_or_else(|| {
            warn!("No default route found, falling back to {}", FALLBACK_GATEWAY);
            FALLBACK_GATEWAY.to_string()
        }),
        Err(e) => {
            warn!("Failed to read routing table: {}", e);
            FALLBACK_GATEWAY.to_string()
        }
    };

    let dns_server = match tokio::fs::read_to_string("/etc/resolv.conf").await {
        Ok(contents) => parse_resolv_conf(&contents).unwrap_or_else(|| default_gateway.clone()),
        Err(e) => {
            warn!("Failed to read resolv.conf: {}", e);
            default_gateway.clone()
        }
    };

    let (ip_range_start, ip_range_end) = derive_range(&default_gateway);

    NetworkParameters {
        default_gateway,
        dns_server,
        ip_range_start,
        ip_range_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_table_picks_default_route() {
        // 0102A8C0 little-endian == 192.168.2.1
        let table = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0102A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0002A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
";
        assert_eq!(parse_route_table(table), Some("192.168.2.1".to_string()));
    }

    #[test]
    fn test_parse_route_table_ignores_non_gateway_routes() {
        let table = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t0002A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
";
        assert_eq!(parse_route_table(table), None);
    }

    #[test]
    fn test_parse_resolv_conf() {
        let contents = "# generated\nsearch lan\nnameserver 10.0.0.53\nnameserver 10.0.0.54\n";
        assert_eq!(parse_resolv_conf(contents), Some("10.0.0.53".to_string()));
        assert_eq!(parse_resolv_conf("search lan\n"), None);
    }

    #[test]
    fn test_derive_range_uses_gateway_prefix() {
        let (start, end) = derive_range("192.168.5.1");
        assert_eq!(start, "192.168.5.100");
        assert_eq!(end, "192.168.5.200");
    }
}
