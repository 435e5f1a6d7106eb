//! Body type used on both sides of the forwarding engine.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Unified body type for forwarded exchanges.
///
/// Upstream `Incoming` bodies box into this type and stream through
/// without buffering; synthesized responses (404, 502, 503, probes) use
/// the helpers below.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// An empty body.
#[must_use]
pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// A body with the given contents.
#[must_use]
pub fn full(data: impl Into<Bytes>) -> ProxyBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}
