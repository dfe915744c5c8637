// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefixed random identifiers.

/// Define a newtype ID over `SmolStr` with a fixed type prefix.
///
/// An ID reads `{prefix}{nanoid}`: a short type marker ("ses-", "job-")
/// followed by 19 random characters, 23 characters total so the whole
/// thing stays inline in a `SmolStr`. The macro generates construction
/// (`new`, `from_string`), accessors (`as_str`, `suffix`), `Display`,
/// `Default`, serde as a plain string, and `PartialEq<&str>` for tests.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random ID.
            pub fn new() -> Self {
                let mut id = String::with_capacity(23);
                id.push_str(Self::PREFIX);
                id.push_str(&nanoid::nanoid!(19));
                Self(smol_str::SmolStr::new(&id))
            }

            /// Wrap an existing string, e.g. one taken from a URL path.
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The random part, without the type prefix.
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
