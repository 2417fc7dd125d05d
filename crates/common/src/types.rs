use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a strongly-typed identifier wrapping a UUID.
///
/// The generated type is `Copy`, hashable, serializes transparently and
/// parses from its hyphenated string form. The invoking crate must depend
/// on `serde`.
///
/// ```
/// common::typed_id!(
///     /// Identifies an invoice.
///     InvoiceId
/// );
///
/// let id = InvoiceId::new();
/// let parsed: InvoiceId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($crate::Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self($crate::Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: $crate::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> $crate::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::ParseIdError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $crate::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| $crate::types::ParseIdError::new(stringify!($name), s))
            }
        }

        impl From<$crate::Uuid> for $name {
            fn from(uuid: $crate::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for $crate::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Raised when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}

impl ParseIdError {
    #[doc(hidden)]
    pub fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }

    /// Returns the name of the identifier type that failed to parse.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl std::fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: '{}'", self.kind, self.input)
    }
}

impl std::error::Error for ParseIdError {}

/// Opaque version marker compared at write time to detect lost updates.
///
/// A fresh token is issued by the store on every successful insert or
/// update. Callers echo back the token they read; a mismatch means someone
/// else wrote in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcurrencyToken(Uuid);

impl ConcurrencyToken {
    /// Issues a new, never-before-seen token.
    pub fn issue() -> Self {
        Self(Uuid::new_v4())
    }

    /// The token carried by an entity that has never been persisted.
    pub fn unset() -> Self {
        Self(Uuid::nil())
    }

    /// Creates a token from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if no store has issued this token yet.
    pub fn is_unset(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ConcurrencyToken {
    fn default() -> Self {
        Self::unset()
    }
}

impl std::fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ConcurrencyToken {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ParseIdError::new("ConcurrencyToken", s))
    }
}

impl From<Uuid> for ConcurrencyToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
