//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The load score was out of range.
    #[error("load score must be between 0.0 and 1.0, got {value}")]
    LoadOutOfRange { value: f64 },

    /// An event ended at or before it started.
    #[error("event {id} must end after it starts")]
    NonPositiveDuration { id: String },

    /// An analysis window ended at or before it started.
    #[error("analysis window must end after it starts")]
    EmptyWindow,

    /// A UTC offset outside the range chrono accepts.
    #[error("UTC offset must be within ±24h, got {minutes} minutes")]
    OffsetOutOfRange { minutes: i32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated calendar event identifier.
    ///
    /// Provider IDs are kept verbatim. Records without one get a
    /// deterministic `{provider}-{index}` ID during normalization.
    EventId, "event ID"
);

define_string_id!(
    /// An opaque identifier for whoever the analysis is for.
    ///
    /// The core never interprets it; it is echoed back in the result so
    /// callers can route plans to the right user and window.
    SubjectId, "subject ID"
);

/// A cognitive load estimate in the range \[0.0, 1.0\].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LoadScore(f64);

impl LoadScore {
    /// The maximum load (1.0).
    pub const MAX: Self = Self(1.0);

    /// No load (0.0).
    pub const ZERO: Self = Self(0.0);

    /// Creates a load score after validation.
    ///
    /// Returns an error if the value is outside \[0.0, 1.0\] or is NaN.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::LoadOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates a load score, clamping to \[0.0, 1.0\].
    ///
    /// NaN values become 0.0.
    #[must_use]
    pub const fn clamped(value: f64) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else if value > 1.0 {
            Self(1.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner f64 value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for LoadScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<f64> for LoadScore {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoadScore> for f64 {
    fn from(score: LoadScore) -> Self {
        score.0
    }
}

impl Serialize for LoadScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LoadScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        // Clamp on deserialization to be lenient with external data
        Ok(Self::clamped(value))
    }
}
