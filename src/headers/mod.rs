//! HTTP Header Fields.
//!
//! [`HeaderMap`] is an insertion-ordered multimap of [`HeaderName`] to
//! [`HeaderValue`]; names compare case-insensitively and store lowercase.

mod iter;
mod map;
mod name;
mod value;

pub use iter::{GetAll, Iter};
pub use map::HeaderMap;
pub use name::{AsHeaderName, HeaderName, IntoHeaderName, InvalidHeaderName, standard};
pub use value::{HeaderValue, InvalidHeaderValue};

#[cfg(test)]
mod test;
