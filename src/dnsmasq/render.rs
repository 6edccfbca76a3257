//! Deterministic rendering of the dnsmasq main configuration.
//!
//! The config is regenerated wholesale on every apply, never patched in
//! place: static base include first, then the conditional ad-block, DHCP,
//! and IPv6 blocks. Identical inputs always produce byte-identical output.

use crate::net::NetworkParameters;

/// Fixed DHCP lease time.
pub const DHCP_LEASE_TIME: &str = "12h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureToggles {
    pub ad_block_enabled: bool,
    pub dhcp_enabled: bool,
    pub ipv6_enabled: bool,
}

pub fn render(
    toggles: &FeatureToggles,
    net: &NetworkParameters,
    static_include_path: &str,
    rule_file_path: &str,
) -> String {
    let mut out = format!("conf-file={}\n", static_include_path);

    if toggles.ad_block_enabled {
        out.push_str(&format!("conf-file={}\n", rule_file_path));
    }
    if toggles.dhcp_enabled {
        out.push_str(&format!(
            "dhcp-range={},{},{}\n",
            net.ip_range_start, net.ip_range_end, DHCP_LEASE_TIME
        ));
        out.push_str(&format!("dhcp-option=option:router,{}\n", net.default_gateway));
        out.push_str(&format!("dhcp-option=option:dns-server,{}\n", net.dns_server));
    }
    if toggles.ipv6_enabled {
        out.push_str("enable-ra\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NetworkParameters {
        NetworkParameters {
            default_gateway: "192.168.1.1".to_string(),
            dns_server: "192.168.1.2".to_string(),
            ip_range_start: "192.168.1.100".to_string(),
            ip_range_end: "192.168.1.200".to_string(),
        }
    }

    #[test]
    fn test_adblock_only_renders_exactly_two_lines() {
        let toggles = FeatureToggles {
            ad_block_enabled: true,
            dhcp_enabled: false,
            ipv6_enabled: false,
        };
        let out = render(&toggles, &params(), "/etc/dnsmasq_static.conf", "/etc/dnsmasq.d/adblock.conf");
        assert_eq!(
            out,
            "conf-file=/etc/dnsmasq_static.conf\nconf-file=/etc/dnsmasq.d/adblock.conf\n"
        );
        assert!(!out.contains("dhcp"));
        assert!(!out.contains("enable-ra"));
    }

    #[test]
    fn test_all_features_enabled() {
        let toggles = FeatureToggles {
            ad_block_enabled: true,
            dhcp_enabled: true,
            ipv6_enabled: true,
        };
        let out = render(&toggles, &params(), "/etc/dnsmasq_static.conf", "/etc/dnsmasq.d/adblock.conf");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "conf-file=/etc/dnsmasq_static.conf",
                "conf-file=/etc/dnsmasq.d/adblock.conf",
                "dhcp-range=192.168.1.100,192.168.1.200,12h",
                "dhcp-option=option:router,192.168.1.1",
                "dhcp-option=option:dns-server,192.168.1.2",
                "enable-ra",
            ]
        );
    }

    #[test]
    fn test_everything_disabled_still_includes_base() {
        let toggles = FeatureToggles {
            ad_block_enabled: false,
            dhcp_enabled: false,
            ipv6_enabled: false,
        };
        let out = render(&toggles, &params(), "/etc/base.conf", "/unused");
        assert_eq!(out, "conf-file=/etc/base.conf\n");
    }

    #[test]
    fn test_render_is_deterministic() {
        let toggles = FeatureToggles {
            ad_block_enabled: true,
            dhcp_enabled: true,
            ipv6_enabled: false,
        };
        let a = render(&toggles, &params(), "/etc/s.conf", "/etc/r.conf");
        let b = render(&toggles, &params(), "/etc/s.conf", "/etc/r.conf");
        assert_eq!(a, b);
    }
}
