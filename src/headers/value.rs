use bytes::Bytes;

use crate::matches::is_value_byte;

// ===== HeaderValue =====

/// HTTP Header Value.
///
/// Values are opaque bytes; control bytes other than HTAB are rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderValue {
    value: Bytes,
}

impl HeaderValue {
    /// Create an empty [`HeaderValue`].
    pub const fn empty() -> Self {
        Self { value: Bytes::new() }
    }

    /// Parse [`HeaderValue`] from shared bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains a control byte other than
    /// HTAB.
    #[inline]
    pub fn from_bytes(value: impl Into<Bytes>) -> Result<Self, InvalidHeaderValue> {
        let value: Bytes = value.into();
        match validate(&value) {
            Ok(()) => Ok(Self { value }),
            Err(err) => Err(err),
        }
    }

    /// Parse [`HeaderValue`] by copying from a slice.
    #[inline]
    pub fn try_copy_from_slice(value: &[u8]) -> Result<Self, InvalidHeaderValue> {
        match validate(value) {
            Ok(()) => Ok(Self { value: Bytes::copy_from_slice(value) }),
            Err(err) => Err(err),
        }
    }

    /// Create [`HeaderValue`] from a static string.
    ///
    /// # Panics
    ///
    /// Panics if the value contains a control byte other than HTAB.
    pub fn from_static(value: &'static str) -> Self {
        match validate(value.as_bytes()) {
            Ok(()) => Self { value: Bytes::from_static(value.as_bytes()) },
            Err(_) => panic!("called `HeaderValue::from_static` with invalid bytes"),
        }
    }

    /// Returns the value as a slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Try to parse the value as [`str`].
    #[inline]
    pub fn try_as_str(&self) -> Result<&str, std::str::Utf8Error> {
        str::from_utf8(&self.value)
    }

    /// Returns `true` if the value has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl PartialEq<[u8]> for HeaderValue {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::str::FromStr for HeaderValue {
    type Err = InvalidHeaderValue;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_copy_from_slice(s.as_bytes())
    }
}

// ===== Parsing =====

const fn validate(value: &[u8]) -> Result<(), InvalidHeaderValue> {
    let mut i = 0;
    while i < value.len() {
        if !is_value_byte(value[i]) {
            return Err(InvalidHeaderValue {});
        }
        i += 1;
    }
    Ok(())
}

// ===== Traits =====

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.value.escape_ascii())
    }
}

// ===== Error =====

/// An error that can occur when parsing a header value.
#[non_exhaustive]
#[derive(Debug)]
pub struct InvalidHeaderValue {}

impl std::error::Error for InvalidHeaderValue {}

impl std::fmt::Display for InvalidHeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("header contains invalid bytes")
    }
}
