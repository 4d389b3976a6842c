use std::{
    convert::Infallible,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use forwarded_header_value::ForwardedHeaderValue;
use tracing::trace;

/// The IP address of the client making a request.
///
/// Proxy headers are preferred over the address of the peer connection so the
/// API can sit behind a load balancer. Requests without any address
/// information resolve to the unspecified address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ip) = forwarded_ip(&parts.headers) {
            trace!(%ip, "Determined client IP from proxy headers.");

            return Ok(Self(ip));
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        Ok(Self(ip))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(value) = headers.get("forwarded").and_then(|v| v.to_str().ok()) {
        if let Ok(forwarded) = ForwardedHeaderValue::from_forwarded(value) {
            if let Some(ip) = forwarded.remotest_forwarded_for_ip() {
                return Some(ip);
            }
        }
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|value| ForwardedHeaderValue::from_x_forwarded_for(value).ok())
        .and_then(|forwarded| forwarded.remotest_forwarded_for_ip())
}
