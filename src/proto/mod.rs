//! HTTP/1.1 client transaction lifecycle.
//!
//! A [`Transaction`] borrows a [`Connection`], emits one request and
//! ingests one response: [`send`], body [`write`]s, [`finish`], [`wait`],
//! body [`read`]s, [`close`].
//!
//! [`Connection`]: crate::pool::Connection
//! [`send`]: Transaction::send
//! [`write`]: Transaction::write
//! [`finish`]: Transaction::finish
//! [`wait`]: Transaction::wait
//! [`read`]: Transaction::read
//! [`close`]: Transaction::close

mod options;
mod transaction;

pub use options::Options;
pub use transaction::{State, Transaction};
