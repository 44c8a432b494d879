// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Macros shared by the engine's status enums and settings structs.

/// Give a fieldless-or-ignored enum a fixed lower-case name per variant.
///
/// Generates `as_str()` returning the name and a `Display` impl that
/// writes it. Variants carrying data list their fields as `(..)`.
///
/// ```ignore
/// ld_core::simple_display! {
///     ActionOutcome {
///         Completed => "completed",
///         Failed(..) => "failed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($fields:tt)* ))? => $name:literal ),+ $(,)? }) => {
        impl $enum {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant $(( $($fields)* ))? => $name, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Chainable setters for a settings struct, placed inside its `impl`.
///
/// Fields under `into` take any `impl Into<T>`. Fields under `option` are
/// `Option<T>` and the setter stores `Some`.
///
/// ```ignore
/// impl EngineConfig {
///     ld_core::setters! {
///         into { work_dir: PathBuf }
///         option { job_timeout: Duration }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into { $( $field:ident : $ty:ty ),* $(,)? })?
        $(option { $( $opt:ident : $opt_ty:ty ),* $(,)? })?
    ) => {
        $($(
            pub fn $field(mut self, value: impl Into<$ty>) -> Self {
                self.$field = value.into();
                self
            }
        )*)?
        $($(
            pub fn $opt(mut self, value: impl Into<$opt_ty>) -> Self {
                self.$opt = Some(value.into());
                self
            }
        )*)?
    };
}

#[cfg(test)]
#[path = "macros_tests.rs"]
mod tests;
