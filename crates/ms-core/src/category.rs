//! Event category enum as the single source of truth for category strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of calendar block an event is.
///
/// Only meetings contribute to the load curve. Every category blocks time
/// when searching for free slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Meeting,
    FocusBlock,
    Personal,
}

impl EventCategory {
    /// Whether events of this category count towards cognitive load.
    pub const fn is_load_bearing(self) -> bool {
        matches!(self, Self::Meeting)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Meeting => "meeting",
            Self::FocusBlock => "focus_block",
            Self::Personal => "personal",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meeting" | "interview" | "training" | "call" => Ok(Self::Meeting),
            "focus_block" | "focus" | "focus_time" | "deep_work" => Ok(Self::FocusBlock),
            "personal" | "break" | "travel" | "other" => Ok(Self::Personal),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for EventCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown category strings.
#[derive(Debug, Clone)]
pub struct UnknownCategory(String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        let variants = [
            EventCategory::Meeting,
            EventCategory::FocusBlock,
            EventCategory::Personal,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed: EventCategory = s.parse().expect("should parse");
            assert_eq!(parsed, *variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn provider_type_aliases_parse() {
        assert_eq!(
            "focus_time".parse::<EventCategory>().unwrap(),
            EventCategory::FocusBlock
        );
        assert_eq!(
            "Interview".parse::<EventCategory>().unwrap(),
            EventCategory::Meeting
        );
        assert_eq!(
            "break".parse::<EventCategory>().unwrap(),
            EventCategory::Personal
        );
    }

    #[test]
    fn unknown_category_errors() {
        let err = "offsite".parse::<EventCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event category: offsite");
    }

    #[test]
    fn only_meetings_carry_load() {
        assert!(EventCategory::Meeting.is_load_bearing());
        assert!(!EventCategory::FocusBlock.is_load_bearing());
        assert!(!EventCategory::Personal.is_load_bearing());
    }
}
