//! SSRF guard
//!
//! Pre-flight check rejecting requests whose target resolves to an internal
//! network address, before any socket is opened. Runs for every URL passing
//! through the HTTP fetcher, including batched `fetch_many` calls.

use std::net::{IpAddr, ToSocketAddrs};
use tokio::net::lookup_host;
use url::Url;

/// Ports a fetch target may use; everything else is refused
const ALLOWED_PORTS: &[u16] = &[80, 443, 8080, 8443];

/// Checks a URL against the SSRF policy
///
/// Rejects targets on disallowed ports, literal private/loopback/link-local
/// IP addresses, and hostnames whose DNS resolution includes any such
/// address. The DNS answer used for the check can in principle differ from
/// the one the client later uses; this guard is a filter, not a pin.
///
/// # Arguments
///
/// * `url` - The parsed URL about to be fetched
///
/// # Returns
///
/// * `Ok(())` - Target is acceptable
/// * `Err(String)` - Human-readable refusal reason
pub async fn check_url_target(url: &Url) -> Result<(), String> {
    let host = url
        .host_str()
        .ok_or_else(|| "URL has no host".to_string())?;

    let port = url
        .port_or_known_default()
        .ok_or_else(|| "URL has no usable port".to_string())?;

    if !ALLOWED_PORTS.contains(&port) {
        return Err(format!("port {} is not allowed", port));
    }

    // Literal IP hosts never hit DNS
    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(format!("target address {} is not public", ip));
        }
        return Ok(());
    }

    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| format!("DNS lookup failed for {}: {}", host, e))?;

    let mut resolved_any = false;
    for addr in addrs {
        resolved_any = true;
        if is_private_ip(&addr.ip()) {
            return Err(format!(
                "{} resolves to non-public address {}",
                host,
                addr.ip()
            ));
        }
    }

    if !resolved_any {
        return Err(format!("{} did not resolve to any address", host));
    }

    Ok(())
}

/// Checks a redirect hop against the same policy as [`check_url_target`]
///
/// Redirect policies run inside the HTTP client and cannot await, so DNS
/// resolution here is the blocking `ToSocketAddrs` path. Applied to every
/// hop the client is asked to follow; a listing that 302s to an internal
/// address is refused mid-flight, not just at the original URL.
pub fn check_redirect_hop(url: &Url) -> Result<(), String> {
    let host = url
        .host_str()
        .ok_or_else(|| "redirect target has no host".to_string())?;

    let port = url
        .port_or_known_default()
        .ok_or_else(|| "redirect target has no usable port".to_string())?;

    if !ALLOWED_PORTS.contains(&port) {
        return Err(format!("redirect to disallowed port {}", port));
    }

    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(format!("redirect to non-public address {}", ip));
        }
        return Ok(());
    }

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("DNS lookup failed for redirect target {}: {}", host, e))?;

    let mut resolved_any = false;
    for addr in addrs {
        resolved_any = true;
        if is_private_ip(&addr.ip()) {
            return Err(format!(
                "redirect target {} resolves to non-public address {}",
                host,
                addr.ip()
            ));
        }
    }

    if !resolved_any {
        return Err(format!("redirect target {} did not resolve", host));
    }

    Ok(())
}

/// True for addresses that must never be fetched: loopback, RFC 1918,
/// link-local, CGNAT, unspecified, and their IPv6 equivalents
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // CGNAT 100.64.0.0/10
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // Unique-local fc00::/7
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // Link-local fe80::/10
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
