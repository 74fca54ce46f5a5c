//! Client identifier resolution from proxy headers.

use axum::http::HeaderMap;

/// Identifier shared by all callers that present no usable header.
pub const FALLBACK_CLIENT_ID: &str = "unknown";

const CDN_CLIENT_IP: &str = "cf-connecting-ip";
const REAL_IP: &str = "x-real-ip";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve a caller identity from proxy headers.
///
/// The CDN header wins over the generic real-IP header, which wins over the
/// first entry of `x-forwarded-for`. Always returns a non-empty string.
pub fn resolve(headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, CDN_CLIENT_IP) {
        return ip.trim().to_string();
    }
    if let Some(ip) = header_str(headers, REAL_IP) {
        return ip.trim().to_string();
    }
    if let Some(forwarded) = header_str(headers, FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    FALLBACK_CLIENT_ID.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}
