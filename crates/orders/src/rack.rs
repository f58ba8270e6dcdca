//! Physical storage rack identifiers.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use washline_core::DomainError;

/// The fixed set of rack tags on the shop floor.
const RACKS: [&str; 12] = [
    "A1", "A2", "A3", "A4", "B1", "B2", "B3", "B4", "C1", "C2", "C3", "C4",
];

/// A validated physical rack tag attached to an order while garments are
/// on-site. Side attribute of an order, independent of status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rack(&'static str);

impl Rack {
    /// Parse a rack tag, rejecting anything outside the closed set.
    pub fn parse(tag: &str) -> Result<Self, DomainError> {
        RACKS
            .into_iter()
            .find(|r| *r == tag)
            .map(Rack)
            .ok_or_else(|| DomainError::validation(format!("unknown rack tag '{tag}'")))
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// All known rack tags.
    pub fn all() -> impl Iterator<Item = Rack> {
        RACKS.into_iter().map(Rack)
    }
}

impl core::fmt::Display for Rack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

impl core::str::FromStr for Rack {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Rack {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for Rack {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Rack::parse(&tag).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_tags() {
        assert_eq!(Rack::parse("A1").unwrap().as_str(), "A1");
        assert_eq!(Rack::parse("C4").unwrap().as_str(), "C4");
    }

    #[test]
    fn parse_rejects_unknown_tags() {
        for bad in ["D1", "a1", "", "A5"] {
            assert!(Rack::parse(bad).is_err(), "expected rejection of '{bad}'");
        }
    }

    #[test]
    fn all_tags_round_trip() {
        for rack in Rack::all() {
            assert_eq!(Rack::parse(rack.as_str()).unwrap(), rack);
        }
    }

    #[test]
    fn deserialize_rejects_unknown_tags() {
        assert!(serde_json::from_str::<Rack>("\"A1\"").is_ok());
        assert!(serde_json::from_str::<Rack>("\"Z9\"").is_err());
    }
}
