//! # HTTP/1.1 Client Protocol Core
//!
//! This library provides the byte-level machinery of an HTTP/1.1 client:
//! request emission, incremental response parsing, body framing, and a
//! keyed pool of reusable connections. It owns no sockets; callers inject
//! a blocking byte transport and the crate drives it.
//!
//! ## Definitions
//!
//! - [`headers`] HTTP Header Fields ([RFC9110 Section 5])
//! - [`Method`] / [`StatusCode`] request and response tokens ([RFC9110])
//!
//! ## Behaviors
//!
//! - [`parser`] incremental head and chunked-framing parsers ([RFC9112])
//! - [`body`] body framing and content coding seams
//! - [`proto`] the request/response transaction lifecycle
//!
//! ## Integrations
//!
//! - [`io`] the transport seam and a buffered implementation over any
//!   blocking stream
//! - [`pool`] keyed reusable connection store
//!
//! # Usage
//!
//! A transaction borrows a connection, typically from the pool:
//!
//! ```no_run
//! use hato::pool::{Pool, PoolKey};
//! use hato::proto::{Options, Transaction};
//! use hato::Method;
//!
//! fn fetch(pool: &Pool) -> Result<Vec<u8>, hato::ProtoError> {
//!     let mut conn = pool.connect(PoolKey { host: "example.com", port: 80, tls: false })?;
//!
//!     let mut tx = Transaction::new(&mut conn);
//!     tx.send(&Options::new(Method::GET, "/"))?;
//!     tx.finish()?;
//!     tx.wait()?;
//!
//!     let mut body = Vec::new();
//!     let mut buf = [0u8; 4096];
//!     loop {
//!         match tx.read(&mut buf)? {
//!             0 => break,
//!             n => body.extend_from_slice(&buf[..n]),
//!         }
//!     }
//!     tx.close();
//!
//!     pool.release(conn);
//!     Ok(body)
//! }
//! ```
//!
//! [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html>
//! [RFC9110 Section 5]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-fields>
//! [RFC9112]: <https://www.rfc-editor.org/rfc/rfc9112.html>
#![warn(missing_debug_implementations)]

mod log;
mod matches;

mod error;
mod method;
mod status;

pub use error::ProtoError;
pub use method::Method;
pub use status::StatusCode;

// definitions
pub mod headers;

// HTTP protocol
pub mod body;
pub mod parser;
pub mod proto;

// integration
pub mod io;
pub mod pool;
