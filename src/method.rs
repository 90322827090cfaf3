/// HTTP request method.
///
/// Only the [RFC9110] methods and PATCH are representable; arbitrary
/// methods are not supported. The protocol core drives framing and
/// connection decisions off the method, so each one carries its request
/// and response properties in a table.
///
/// [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-methods>
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(u8);

struct Props {
    /// request content is meaningful for this method
    body: bool,
    /// responses never carry content, whatever their headers claim
    bodiless: bool,
    /// a 2xx response hands the connection over for blind forwarding
    tunnel: bool,
    value: &'static [u8],
}

props! {
    static PROPS: [9];

    /// Requests transfer of the target resource's current representation.
    pub const GET = (0, b"GET", , , );
    /// Identical to GET, except the response carries no content.
    pub const HEAD = (1, b"HEAD", , bodiless, );
    /// Requests that the target resource process the enclosed
    /// representation according to its own semantics.
    pub const POST = (2, b"POST", body, , );
    /// Requests that the target resource's state be created or replaced
    /// by the enclosed representation.
    pub const PUT = (3, b"PUT", body, , );
    /// Requests removal of the target resource.
    pub const DELETE = (4, b"DELETE", body, , );
    /// Requests a tunnel to the destination origin server; after a
    /// successful response the connection carries arbitrary bytes in
    /// both directions.
    pub const CONNECT = (5, b"CONNECT", , , tunnel);
    /// Requests the communication options available for the target
    /// resource.
    pub const OPTIONS = (6, b"OPTIONS", body, , );
    /// Requests an application-level loop-back of the request message.
    pub const TRACE = (7, b"TRACE", , , );
    /// Requests that the enclosed set of changes be applied to the
    /// target resource.
    pub const PATCH = (8, b"PATCH", body, , );
}

impl Method {
    /// Returns `true` if a request with this method may carry content.
    #[inline]
    pub const fn permits_request_body(&self) -> bool {
        PROPS[self.0 as usize].body
    }

    /// Returns `true` if responses to this method never carry content,
    /// whatever their framing headers declare.
    #[inline]
    pub const fn suppresses_response_body(&self) -> bool {
        PROPS[self.0 as usize].bodiless
    }

    /// Returns `true` if a successful response stops being HTTP and
    /// hands the connection over for blind byte forwarding.
    #[inline]
    pub const fn opens_tunnel(&self) -> bool {
        PROPS[self.0 as usize].tunnel
    }

    /// Returns string representation of the method.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        // tokens in the table are ASCII
        unsafe { str::from_utf8_unchecked(PROPS[self.0 as usize].value) }
    }
}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or(UnknownMethod)
    }
}

impl std::fmt::Debug for Method {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Error =====

/// An error when trying to parse [`Method`] from a string.
#[derive(Debug)]
pub struct UnknownMethod;

impl std::error::Error for UnknownMethod {}

impl std::fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("unknown method")
    }
}

// ===== Macros =====

macro_rules! props {
    (
        static $props:ident: [$len:literal];
        $(
            $(#[$doc:meta])*
            pub const $name:ident =
                ($idx:literal, $val:literal, $($body:ident)?, $($bodiless:ident)?, $($tunnel:ident)?);
        )*
    ) => {
        impl Method {
            $(
                $(#[$doc])*
                pub const $name: Self = Self($idx);
            )*

            /// Create [`Method`] from bytes.
            #[inline]
            pub const fn from_bytes(src: &[u8]) -> Option<Method> {
                match src {
                    $(
                        $val => Some(Self::$name),
                    )*
                    _ => None,
                }
            }
        }

        static $props: [Props; $len] = [
            $(
                Props {
                    value: $val,
                    body: flag!($($body)?),
                    bodiless: flag!($($bodiless)?),
                    tunnel: flag!($($tunnel)?),
                },
            )*
        ];
    };
}

macro_rules! flag {
    (body) => { true };
    (bodiless) => { true };
    (tunnel) => { true };
    () => { false };
}

use {flag, props};
