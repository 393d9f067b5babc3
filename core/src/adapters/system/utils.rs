//! Helpers shared by the connection tool parsers.

/// Split a tool's `host:port` endpoint into `(host, port)`.
///
/// Handles `[v6]:port`, bare IPv6 with the port after the last colon,
/// `*` wildcard hosts (returned as ""), and `%iface` scope suffixes
/// (dropped). Returns `None` when the port is not numeric, e.g. `*:*`.
pub fn split_endpoint(endpoint: &str) -> Option<(String, u16)> {
    let colon = endpoint.rfind(':')?;
    let port: u16 = endpoint[colon + 1..].parse().ok()?;

    let host = &endpoint[..colon];
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let host = host.split('%').next().unwrap_or(host);
    let host = if host == "*" { "" } else { host };

    Some((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert_eq!(split_endpoint("127.0.0.1:3000"), Some(("127.0.0.1".to_string(), 3000)));
        assert_eq!(split_endpoint("0.0.0.0:135"), Some(("0.0.0.0".to_string(), 135)));
    }

    #[test]
    fn test_ipv6() {
        assert_eq!(split_endpoint("[::]:445"), Some(("::".to_string(), 445)));
        assert_eq!(split_endpoint("[::1]:6379"), Some(("::1".to_string(), 6379)));
        assert_eq!(split_endpoint("[fe80::1]:8080"), Some(("fe80::1".to_string(), 8080)));
        assert_eq!(
            split_endpoint("[::ffff:127.0.0.1]:80"),
            Some(("::ffff:127.0.0.1".to_string(), 80))
        );
    }

    #[test]
    fn test_wildcard_and_scope() {
        assert_eq!(split_endpoint("*:22"), Some((String::new(), 22)));
        assert_eq!(split_endpoint("127.0.0.53%lo:53"), Some(("127.0.0.53".to_string(), 53)));
        assert_eq!(split_endpoint("[fe80::1%eth0]:546"), Some(("fe80::1".to_string(), 546)));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(split_endpoint("*:*"), None);
        assert_eq!(split_endpoint("0.0.0.0:99999"), None);
        assert_eq!(split_endpoint("garbage"), None);
    }
}
