// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` impl mapping enum variants to string literals
//! - [`setters!`] — chainable setter methods inside an existing `impl` block
//! - [`builder!`] — test-support builder struct on top of [`setters!`]

/// Generate a `Display` impl that maps unit enum variants to string literals.
#[macro_export]
macro_rules! simple_display {
    ($name:ty { $( $variant:ident => $text:literal ),+ $(,)? }) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $( Self::$variant => $text, )+
                };
                f.write_str(text)
            }
        }
    };
}

/// Generate consuming setter methods for the fields of the surrounding type.
///
/// Three field groups, all optional:
/// - `into { field: Type }` — setter takes `impl Into<Type>`
/// - `set { field: Type }` — setter takes `Type` directly
/// - `option { field: Type }` — the field is `Option<Type>`; the setter
///   takes `impl Into<Type>` and stores `Some`
#[macro_export]
macro_rules! setters {
    (
        $(into { $( $into_field:ident : $into_ty:ty ),* $(,)? })?
        $(set { $( $plain_field:ident : $plain_ty:ty ),* $(,)? })?
        $(option { $( $opt_field:ident : $opt_ty:ty ),* $(,)? })?
    ) => {
        $($(
            pub fn $into_field(mut self, value: impl Into<$into_ty>) -> Self {
                self.$into_field = value.into();
                self
            }
        )*)?
        $($(
            pub fn $plain_field(mut self, value: $plain_ty) -> Self {
                self.$plain_field = value;
                self
            }
        )*)?
        $($(
            pub fn $opt_field(mut self, value: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(value.into());
                self
            }
        )*)?
    };
}

/// Generate a test builder: a struct with per-field defaults, setters from
/// [`setters!`], a `build()` that assembles the target, and a
/// `Target::builder()` entry point.
///
/// Field groups match [`setters!`], each with a `= default` expression.
/// Everything is gated behind `#[cfg(any(test, feature = "test-support"))]`.
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into { $( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)? })?
            $(set { $( $plain_field:ident : $plain_ty:ty = $plain_default:expr ),* $(,)? })?
            $(option { $( $opt_field:ident : $opt_ty:ty = $opt_default:expr ),* $(,)? })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $into_field: $into_ty, )*)?
            $($( $plain_field: $plain_ty, )*)?
            $($( $opt_field: Option<$opt_ty>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $into_field: $into_default.into(), )*)?
                    $($( $plain_field: $plain_default, )*)?
                    $($( $opt_field: $opt_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $crate::setters! {
                $(into { $( $into_field: $into_ty ),* })?
                $(set { $( $plain_field: $plain_ty ),* })?
                $(option { $( $opt_field: $opt_ty ),* })?
            }

            pub fn build(self) -> $target {
                $target {
                    $($( $into_field: self.$into_field, )*)?
                    $($( $plain_field: self.$plain_field, )*)?
                    $($( $opt_field: self.$opt_field, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Create a builder with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
