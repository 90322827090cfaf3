use crate::body::{Coding, Framing};
use crate::headers::HeaderMap;
use crate::method::Method;

/// Per-transaction request parameters.
///
/// The target is the request-target as it appears on the wire: origin form
/// (`/path?query`) for ordinary requests, authority form (`host:port`) for
/// `CONNECT`.
///
/// `Transfer-Encoding` and `Content-Length` are derived from [`body`] and
/// [`coding`]; supplying either as a header fails the transaction.
///
/// [`body`]: Options::body
/// [`coding`]: Options::coding
#[derive(Debug)]
pub struct Options<'a> {
    pub method: Method,
    pub target: &'a str,
    /// Caller headers, emitted in insertion order; entries with empty
    /// values are skipped.
    pub headers: HeaderMap,
    /// Request body framing.
    pub body: Framing,
    /// Request body coding; only identity and deflate are writable.
    pub coding: Coding,
}

impl<'a> Options<'a> {
    /// Create [`Options`] for a bodyless request.
    pub fn new(method: Method, target: &'a str) -> Self {
        Self {
            method,
            target,
            headers: HeaderMap::new(),
            body: Framing::None,
            coding: Coding::Identity,
        }
    }
}
