use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use axum::http::header;
use reqwest::{Url, redirect};

use crate::{
    error::{AppError, AppResult},
    invoice::{InvoiceData, render_svg},
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 5;

pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="400" viewBox="0 0 400 400"><rect width="400" height="400" fill="#f3f4f6"/><path d="M140 250l45-60 35 45 25-30 45 45z" fill="#d1d5db"/><circle cx="250" cy="160" r="18" fill="#d1d5db"/></svg>"##;

fn is_internal_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        // 100.64.0.0/10, carrier-grade NAT
        || (a == 100 && (64..128).contains(&b))
}

fn is_internal_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
}

/// Hosts the proxy must never reach: `localhost` and IP literals in
/// loopback, private, link-local or otherwise non-public ranges.
/// Hostnames are not resolved here.
pub fn is_internal_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_internal_v4(ip),
        Ok(IpAddr::V6(ip)) => is_internal_v6(ip),
        Err(_) => false,
    }
}

/// Only absolute `http`/`https` URLs to public hosts may be proxied.
pub fn validate_proxy_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::BadRequest("invalid url".into()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => {}
        _ => return Err(AppError::BadRequest("url must be http or https".into())),
    }
    if is_internal_host(&url) {
        return Err(AppError::BadRequest("url host is not allowed".into()));
    }
    Ok(url)
}

/// Redirects are followed only towards hosts `validate_proxy_url` accepts.
pub fn proxy_redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.stop()
        } else if matches!(attempt.url().scheme(), "http" | "https") && !is_internal_host(attempt.url()) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

/// Outbound client for the image proxy.
pub fn proxy_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(proxy_redirect_policy())
        .timeout(FETCH_TIMEOUT)
        .build()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fetch an upstream image. `None` on any failure or when the upstream
/// does not answer with an image.
pub async fn fetch_image(http: &reqwest::Client, url: Url) -> Option<reqwest::Response> {
    let response = match http.get(url.clone()).timeout(FETCH_TIMEOUT).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%url, error = %err, "image proxy fetch failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(%url, status = %response.status(), "image proxy upstream error");
        return None;
    }

    let is_image = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        tracing::warn!(%url, "image proxy upstream is not an image");
        return None;
    }

    Some(response)
}

/// Invoice preview from query parameters; all three are required.
pub fn invoice_preview(
    store_name: &str,
    sku: Option<&str>,
    price: Option<&str>,
    name: Option<&str>,
) -> AppResult<String> {
    let (Some(sku), Some(price), Some(name)) = (present(sku), present(price), present(name)) else {
        return Err(AppError::BadRequest("sku, price and name are required".into()));
    };
    let unit_price: i64 = price
        .parse()
        .map_err(|_| AppError::BadRequest("price must be an integer".into()))?;

    Ok(render_svg(&InvoiceData {
        store_name,
        sku,
        customer_name: name,
        variation: None,
        quantity: 1,
        unit_price,
        issued_at: chrono::Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_urls() {
        assert!(validate_proxy_url("https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_proxy_url("http://cdn.example.com/a.jpg").is_ok());
        assert!(validate_proxy_url("ftp://cdn.example.com/a.jpg").is_err());
        assert!(validate_proxy_url("file:///etc/passwd").is_err());
        assert!(validate_proxy_url("not a url").is_err());
    }

    #[test]
    fn proxy_refuses_internal_hosts() {
        for raw in [
            "http://127.0.0.1/a.png",
            "http://localhost:8080/a.png",
            "http://api.localhost/a.png",
            "http://169.254.169.254/latest/meta-data/",
            "http://10.0.0.7/a.png",
            "http://192.168.1.1/a.png",
            "http://172.16.0.1/a.png",
            "http://100.64.0.1/a.png",
            "http://0.0.0.0/a.png",
            "http://[::1]/a.png",
            "http://[fd00::1]/a.png",
            "http://[fe80::1]/a.png",
            "http://[::ffff:127.0.0.1]/a.png",
        ] {
            assert!(
                matches!(validate_proxy_url(raw), Err(AppError::BadRequest(_))),
                "{raw} should be refused"
            );
        }
        assert!(validate_proxy_url("https://93.184.216.34/a.png").is_ok());
        assert!(validate_proxy_url("https://[2606:4700::1111]/a.png").is_ok());
    }

    #[test]
    fn blank_params_are_missing() {
        assert_eq!(present(Some("  DRS-01 ")), Some("DRS-01"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
        assert!(invoice_preview("Store", Some(" "), Some("150000"), Some("Sari")).is_err());
    }

    #[test]
    fn proxy_client_builds() {
        assert!(proxy_client().is_ok());
    }

    #[test]
    fn invoice_preview_requires_all_params() {
        assert!(invoice_preview("Store", Some("DRS-01"), Some("150000"), None).is_err());
        assert!(invoice_preview("Store", Some("DRS-01"), Some("abc"), Some("Sari")).is_err());
        let svg = invoice_preview("Store", Some("DRS-01"), Some("150000"), Some("Sari")).unwrap();
        assert!(svg.contains("Rp 150.000"));
    }

    #[test]
    fn placeholder_is_svg() {
        assert!(PLACEHOLDER_SVG.starts_with("<svg"));
    }
}
