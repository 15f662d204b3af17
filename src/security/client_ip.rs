//! Canonical client identity extraction.
//!
//! The gateway sits behind a reverse proxy (and optionally a CDN), so
//! the transport peer is usually the proxy itself. Precedence, first
//! match wins: `cf-connecting-ip` → first `x-forwarded-for` entry →
//! `x-real-ip` → transport peer → `"unknown"`. Header authenticity is
//! not validated.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Derive the canonical client address used as the rate-limit key.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = header_value(headers, "cf-connecting-ip") {
        return ip;
    }

    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        // Take the first IP in the chain (client IP).
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(ip) = header_value(headers, "x-real-ip") {
        return ip;
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
