//! String newtypes that must not be mixed up. Both serialize as plain strings.

use serde::Serialize;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(
    /// Hex blake3 digest of a fully resolved project configuration.
    Checksum
);

string_newtype!(
    /// Container image reference, e.g. `wordpress:cli-php8.2`.
    ImageRef
);
