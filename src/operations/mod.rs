//! Typed transformations applied to the forwarded exchange.
//!
//! Each rule carries an ordered list of request operations and an ordered
//! list of response operations. Both families are open-ended tagged
//! variants; `add_header` is the bundled one. Well-formedness of the raw
//! document form is checked during configuration validation, so resolved
//! operations hold pre-parsed header names and values and apply
//! infallibly.

use http::header::{HeaderName, HeaderValue};
use http::{Request, Response};

/// A transformation applied to the forwarded request before it is sent
/// upstream.
#[derive(Debug, Clone)]
pub enum RequestOperation {
    /// Append a header to the request.
    AddHeader {
        /// Header name.
        header: HeaderName,
        /// Header value.
        value: HeaderValue,
    },
}

impl RequestOperation {
    /// Apply the operation to the request in place.
    pub fn apply<B>(&self, request: &mut Request<B>) {
        match self {
            Self::AddHeader { header, value } => {
                request.headers_mut().append(header.clone(), value.clone());
            },
        }
    }
}

/// A transformation applied to the upstream response before it is
/// streamed back to the caller.
#[derive(Debug, Clone)]
pub enum ResponseOperation {
    /// Append a header to the response.
    AddHeader {
        /// Header name.
        header: HeaderName,
        /// Header value.
        value: HeaderValue,
    },
}

impl ResponseOperation {
    /// Apply the operation to the response in place.
    pub fn apply<B>(&self, response: &mut Response<B>) {
        match self {
            Self::AddHeader { header, value } => {
                response.headers_mut().append(header.clone(), value.clone());
            },
        }
    }
}
