//! Incremental HTTP/1.1 wire parsers.
//!
//! Both parsers here are byte-driven state machines: the caller feeds
//! whatever bytes the transport produced, the parser reports how many it
//! consumed, and the remainder belongs to the next protocol element. No
//! parser in this module allocates.

mod simd;

mod chunked;
mod head;

pub use chunked::ChunkParser;
pub use head::HeadScanner;
pub use simd::{first_cr_or_lf, index_of_byte_in_word};

#[cfg(test)]
mod test;
