use bytes::Bytes;

use crate::matches::is_token;

// ===== HeaderName =====

/// HTTP Header name.
///
/// Names are drawn from the token alphabet and compared case-insensitively;
/// the canonical stored form is lowercase. Prefer the [provided constants]
/// over strings, they carry a precomputed hash code.
///
/// [provided constants]: super::standard
#[derive(Clone)]
pub struct HeaderName {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Standard(StandardHeader),
    Bytes(Bytes),
}

/// Precomputed known header name.
#[derive(Clone)]
struct StandardHeader {
    name: &'static str,
    hash: u32,
}

impl HeaderName {
    /// Create a [`HeaderName`] from bytes that are already lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, contains a byte outside the
    /// token alphabet, or contains an uppercase letter.
    pub fn from_bytes_lowercase(name: impl Into<Bytes>) -> Result<Self, InvalidHeaderName> {
        let name: Bytes = name.into();

        if name.is_empty() {
            return Err(InvalidHeaderName {});
        }
        let mut i = 0;
        while i < name.len() {
            let byte = name[i];
            if !is_token(byte) || byte.is_ascii_uppercase() {
                return Err(InvalidHeaderName {});
            }
            i += 1;
        }

        Ok(Self { repr: Repr::Bytes(name) })
    }

    /// Create a [`HeaderName`] by copying and lowercasing `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a byte outside
    /// the token alphabet.
    pub fn from_slice(name: &[u8]) -> Result<Self, InvalidHeaderName> {
        let mut owned = name.to_vec();
        owned.make_ascii_lowercase();
        Self::from_bytes_lowercase(owned)
    }

    /// Extracts a string slice of the header name.
    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Standard(s) => s.name,
            // token bytes are ASCII
            Repr::Bytes(b) => unsafe { str::from_utf8_unchecked(b) },
        }
    }

    /// May calculate the hash.
    pub(crate) fn hash(&self) -> u32 {
        match &self.repr {
            Repr::Standard(s) => s.hash,
            Repr::Bytes(b) => fnv_hash(b),
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for HeaderName {}

impl PartialEq<str> for HeaderName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl std::fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Hash =====

#[inline]
pub(crate) const fn fnv_hash(bytes: &[u8]) -> u32 {
    const INITIAL_STATE: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = INITIAL_STATE;
    let mut i = 0;

    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }

    hash as _
}

// ===== Ref Traits =====

/// A type that can be used for header map lookup operations.
///
/// When using a static `str` it must be a valid header name in ASCII
/// lowercase, otherwise lookups cannot match.
#[allow(private_bounds)]
pub trait AsHeaderName: SealedRef {}
pub(crate) trait SealedRef {
    fn hash(&self) -> u32;

    /// Returns the lowercase name.
    fn as_str(&self) -> &str;
}

impl<K: AsHeaderName> AsHeaderName for &K {}
impl<S: SealedRef> SealedRef for &S {
    fn hash(&self) -> u32 {
        S::hash(self)
    }

    fn as_str(&self) -> &str {
        S::as_str(self)
    }
}

impl AsHeaderName for &str {}
impl SealedRef for &str {
    fn hash(&self) -> u32 {
        fnv_hash(self.as_bytes())
    }

    fn as_str(&self) -> &str {
        self
    }
}

impl AsHeaderName for HeaderName {}
impl SealedRef for HeaderName {
    fn hash(&self) -> u32 {
        HeaderName::hash(self)
    }

    fn as_str(&self) -> &str {
        HeaderName::as_str(self)
    }
}

// ===== Owned Traits =====

/// A type that can be used for name consuming header map operations.
#[allow(private_bounds)]
pub trait IntoHeaderName: Sealed {}
pub(crate) trait Sealed {
    fn into_header_name(self) -> HeaderName;
}

impl IntoHeaderName for HeaderName {}
impl Sealed for HeaderName {
    fn into_header_name(self) -> HeaderName {
        self
    }
}

/// Copies and lowercases; panics on a byte outside the token alphabet.
impl IntoHeaderName for &str {}
impl Sealed for &str {
    fn into_header_name(self) -> HeaderName {
        HeaderName::from_slice(self.as_bytes())
            .expect("called a header map insert operation with an invalid header name")
    }
}

// ===== Constants =====

standard_header! {
    /// Authority the request is directed at.
    pub const HOST: HeaderName = "host";
    /// Identifies the requesting client software.
    pub const USER_AGENT: HeaderName = "user-agent";
    /// Controls whether the connection stays open after the transaction.
    pub const CONNECTION: HeaderName = "connection";
    /// Media types the client can consume.
    pub const ACCEPT: HeaderName = "accept";
    /// Content codings the client can consume.
    pub const ACCEPT_ENCODING: HeaderName = "accept-encoding";
    /// Transfer codings the client is willing to accept beyond chunked.
    pub const TE: HeaderName = "te";
    /// Transfer codings applied to the message body, chunked last.
    pub const TRANSFER_ENCODING: HeaderName = "transfer-encoding";
    /// Byte length of the message body.
    pub const CONTENT_LENGTH: HeaderName = "content-length";
    /// End-to-end coding applied to the representation.
    pub const CONTENT_ENCODING: HeaderName = "content-encoding";
    /// Media type of the representation.
    pub const CONTENT_TYPE: HeaderName = "content-type";
    /// Fields the sender promises to deliver in the chunked trailer.
    pub const TRAILER: HeaderName = "trailer";
}

// ===== Macros =====

macro_rules! standard_header {
    (
        $(
            $(#[$doc:meta])*
            pub const $id:ident: $t:ty = $name:literal;
        )*
    ) => {
        /// Precomputed known header names.
        pub mod standard {
            pub use {$(super::$id),*};
        }
        $(
            $(#[$doc])*
            pub const $id: $t = HeaderName {
                repr: Repr::Standard(StandardHeader {
                    name: $name,
                    hash: fnv_hash($name.as_bytes()),
                }),
            };
        )*
    };
}

use standard_header;

// ===== Error =====

/// An error that can occur when parsing a header name.
#[non_exhaustive]
#[derive(Debug)]
pub struct InvalidHeaderName {}

impl std::error::Error for InvalidHeaderName {}

impl std::fmt::Display for InvalidHeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid header name")
    }
}
