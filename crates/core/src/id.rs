//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are opaque strings assigned by the persistence layer. Both store
//! variants mint them from time-ordered UUIDv7 values, but nothing in the domain
//! depends on that format.

/// Mint a fresh opaque identifier string (UUIDv7, time-ordered).
pub fn generate_raw() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Declare a `String`-backed identifier newtype.
///
/// The generated type is serde-transparent, displays as its inner string and
/// rejects blank input in `FromStr`. Crates invoking the macro need `serde` as a
/// dependency.
#[macro_export]
macro_rules! opaque_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(String);

        impl $t {
            /// Wrap an existing identifier value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Mint a new identifier (used by stores on insert).
            pub fn generate() -> Self {
                Self($crate::id::generate_raw())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier is empty or whitespace only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err($crate::DomainError::invalid_id(format!("{} must not be blank", $name)));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

opaque_id!(
    /// Identifier of a user (the admin who created a shift).
    UserId,
    "UserId"
);
opaque_id!(
    /// Identifier of a worksite owned by a company.
    WorksiteId,
    "WorksiteId"
);
opaque_id!(
    /// Identifier of a worker that shifts are offered to.
    WorkerId,
    "WorkerId"
);

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn blank_ids_are_rejected_by_from_str() {
        assert!(WorksiteId::from_str("   ").is_err());
        assert_eq!(WorksiteId::from_str("ws-1").unwrap().as_str(), "ws-1");
    }

    #[test]
    fn generated_ids_are_distinct_and_non_blank() {
        let a = WorkerId::generate();
        let b = WorkerId::generate();
        assert_ne!(a, b);
        assert!(!a.is_blank());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = UserId::new("u-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u-7\"");
    }
}
