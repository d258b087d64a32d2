//! Macros for defining typed identifier types.

/// Validates a raw document name and returns its trimmed form.
#[doc(hidden)]
pub fn validate_name(kind: &'static str, raw: &str) -> Result<String, crate::IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(crate::IdError::Empty { kind });
    }

    let len = trimmed.chars().count();
    if len > crate::MAX_NAME_LEN {
        return Err(crate::IdError::TooLong {
            kind,
            max: crate::MAX_NAME_LEN,
            actual: len,
        });
    }

    if let Some(position) = trimmed.chars().position(char::is_control) {
        return Err(crate::IdError::ControlCharacter { kind, position });
    }

    Ok(trimmed.to_string())
}

/// Macro to define a typed identifier backed by a validated document name.
///
/// This generates a newtype wrapper around `String` with:
/// - A `KIND` constant used in error messages
/// - `parse()` to validate from a string
/// - `as_str()` to borrow the name
/// - `Display` and `FromStr` implementations
/// - `Serialize` and `Deserialize` implementations (deserialization validates)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_name!(WorkerId, "worker");
///
/// let worker: WorkerId = "TW-0001".parse()?;
/// assert_eq!(worker.as_str(), "TW-0001");
/// ```
#[macro_export]
macro_rules! define_name {
    ($name:ident, $kind:literal) => {
        /// A typed document-name identifier.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Human-readable kind of this identifier.
            pub const KIND: &'static str = $kind;

            /// Parses and validates an identifier from a string.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                $crate::macros::validate_name(Self::KIND, s).map(Self)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the owned name.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}
