//! Hierarchy levels and the positional component record behind a PID.

use serde::{Deserialize, Serialize};

use crate::pid::PidError;

/// Positional level of a PID component.
///
/// The order is fixed: a PID is always read country first, unit last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PidLevel {
    /// ISO 3166-1 alpha-2 country code
    Country,
    /// First administrative division (prefecture, state)
    Admin1,
    /// Second administrative division (city, ward)
    Admin2,
    /// Locality / neighbourhood
    Locality,
    /// Sublocality (town, chome)
    Sublocality,
    /// Block / street number
    Block,
    /// Building
    Building,
    /// Unit / room
    Unit,
}

impl PidLevel {
    /// Get all levels in hierarchical order (country first)
    pub fn all() -> &'static [PidLevel] {
        &[
            PidLevel::Country,
            PidLevel::Admin1,
            PidLevel::Admin2,
            PidLevel::Locality,
            PidLevel::Sublocality,
            PidLevel::Block,
            PidLevel::Building,
            PidLevel::Unit,
        ]
    }

    /// Levels that may follow the country code
    pub fn below_country() -> &'static [PidLevel] {
        &Self::all()[1..]
    }

    /// Zero-based position in a PID string
    pub fn position(&self) -> usize {
        match self {
            PidLevel::Country => 0,
            PidLevel::Admin1 => 1,
            PidLevel::Admin2 => 2,
            PidLevel::Locality => 3,
            PidLevel::Sublocality => 4,
            PidLevel::Block => 5,
            PidLevel::Building => 6,
            PidLevel::Unit => 7,
        }
    }

    /// Level at a zero-based position
    pub fn from_position(position: usize) -> Option<Self> {
        Self::all().get(position).copied()
    }

    /// The level directly below this one
    pub fn next(&self) -> Option<Self> {
        Self::from_position(self.position() + 1)
    }

    /// Get the field name for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            PidLevel::Country => "country",
            PidLevel::Admin1 => "admin1",
            PidLevel::Admin2 => "admin2",
            PidLevel::Locality => "locality",
            PidLevel::Sublocality => "sublocality",
            PidLevel::Block => "block",
            PidLevel::Building => "building",
            PidLevel::Unit => "unit",
        }
    }
}

impl std::fmt::Display for PidLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Parsed components of a PID.
///
/// The record is prefix-closed: a level can only be set when every level
/// above it is set, so `block` never exists without `admin1..locality`.
/// Values are uppercased on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PidComponents {
    country: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    admin1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    admin2: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    locality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    sublocality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    building: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,

    /// Collision suffix, e.g. `C01`
    #[serde(skip_serializing_if = "Option::is_none")]
    collision: Option<String>,
}

impl PidComponents {
    /// Start a record at the country level
    pub fn new(country: &str) -> Result<Self, PidError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(PidError::MissingCountry);
        }

        Ok(Self {
            country: country.to_uppercase(),
            admin1: None,
            admin2: None,
            locality: None,
            sublocality: None,
            block: None,
            building: None,
            unit: None,
            collision: None,
        })
    }

    /// Set the next level down.
    ///
    /// `level` must be exactly one below the deepest level already set.
    pub fn with(mut self, level: PidLevel, value: &str) -> Result<Self, PidError> {
        let expected = self
            .deepest()
            .next()
            .ok_or(PidError::ExcessComponents(self.depth() + 1))?;
        if level != expected {
            return Err(PidError::OutOfOrder { level, expected });
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(PidError::EmptyComponent(level));
        }

        let slot = match level {
            // Set on construction; depth() is never 0
            PidLevel::Country => return Err(PidError::OutOfOrder { level, expected }),
            PidLevel::Admin1 => &mut self.admin1,
            PidLevel::Admin2 => &mut self.admin2,
            PidLevel::Locality => &mut self.locality,
            PidLevel::Sublocality => &mut self.sublocality,
            PidLevel::Block => &mut self.block,
            PidLevel::Building => &mut self.building,
            PidLevel::Unit => &mut self.unit,
        };
        *slot = Some(value.to_uppercase());
        Ok(self)
    }

    /// Attach a collision suffix verbatim (uppercased)
    pub fn with_collision(mut self, collision: &str) -> Self {
        self.collision = Some(collision.to_uppercase());
        self
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Get the value stored at a level
    pub fn get(&self, level: PidLevel) -> Option<&str> {
        match level {
            PidLevel::Country => Some(self.country.as_str()),
            PidLevel::Admin1 => self.admin1.as_deref(),
            PidLevel::Admin2 => self.admin2.as_deref(),
            PidLevel::Locality => self.locality.as_deref(),
            PidLevel::Sublocality => self.sublocality.as_deref(),
            PidLevel::Block => self.block.as_deref(),
            PidLevel::Building => self.building.as_deref(),
            PidLevel::Unit => self.unit.as_deref(),
        }
    }

    pub fn collision(&self) -> Option<&str> {
        self.collision.as_deref()
    }

    /// Number of levels set, country included, collision excluded
    pub fn depth(&self) -> usize {
        self.levels().count()
    }

    /// Iterate over the populated levels, country first
    pub fn levels(&self) -> impl Iterator<Item = (PidLevel, &str)> + '_ {
        PidLevel::all()
            .iter()
            .map_while(|level| self.get(*level).map(|value| (*level, value)))
    }

    /// Deepest populated level
    pub fn deepest(&self) -> PidLevel {
        self.levels()
            .last()
            .map(|(level, _)| level)
            .unwrap_or(PidLevel::Country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_positions_round_trip() {
        for level in PidLevel::all() {
            assert_eq!(PidLevel::from_position(level.position()), Some(*level));
        }
        assert_eq!(PidLevel::from_position(8), None);
        assert_eq!(PidLevel::Unit.next(), None);
        assert_eq!(PidLevel::Country.next(), Some(PidLevel::Admin1));
    }

    #[test]
    fn test_builder_uppercases() {
        let components = PidComponents::new("jp")
            .and_then(|c| c.with(PidLevel::Admin1, "13"))
            .and_then(|c| c.with(PidLevel::Admin2, "abc"))
            .unwrap();

        assert_eq!(components.country(), "JP");
        assert_eq!(components.get(PidLevel::Admin2), Some("ABC"));
        assert_eq!(components.depth(), 3);
        assert_eq!(components.deepest(), PidLevel::Admin2);
    }

    #[test]
    fn test_builder_rejects_gaps() {
        let err = PidComponents::new("JP")
            .unwrap()
            .with(PidLevel::Locality, "01")
            .unwrap_err();

        assert!(matches!(
            err,
            PidError::OutOfOrder {
                level: PidLevel::Locality,
                expected: PidLevel::Admin1
            }
        ));
    }

    #[test]
    fn test_builder_rejects_level_past_unit() {
        let mut components = PidComponents::new("JP").unwrap();
        for level in PidLevel::below_country() {
            components = components.with(*level, "1").unwrap();
        }
        assert_eq!(components.deepest(), PidLevel::Unit);

        let err = components.with(PidLevel::Unit, "2").unwrap_err();
        assert_eq!(err, PidError::ExcessComponents(9));
    }

    #[test]
    fn test_builder_rejects_blank_values() {
        assert!(matches!(
            PidComponents::new("  "),
            Err(PidError::MissingCountry)
        ));
        assert!(matches!(
            PidComponents::new("JP").unwrap().with(PidLevel::Admin1, " "),
            Err(PidError::EmptyComponent(PidLevel::Admin1))
        ));
    }

    #[test]
    fn test_serialize_skips_absent_levels() {
        let components = PidComponents::new("JP")
            .unwrap()
            .with(PidLevel::Admin1, "13")
            .unwrap()
            .with_collision("c01");

        let json = serde_json::to_value(&components).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"country": "JP", "admin1": "13", "collision": "C01"})
        );
    }
}
