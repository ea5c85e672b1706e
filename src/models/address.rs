//! Address input handed over by the normalization layer.

use serde::{Deserialize, Serialize};

use super::PidLevel;

/// Already-decomposed address fields for one country.
///
/// Unlike [`super::PidComponents`] this record may contain gaps; the
/// encoder stops at the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    /// ISO 3166-1 alpha-2 country code
    #[serde(alias = "countryCode")]
    pub country_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublocality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl NormalizedAddress {
    pub fn new(country_code: &str) -> Self {
        Self {
            country_code: country_code.to_string(),
            ..Default::default()
        }
    }

    /// Set a field for a given level
    pub fn set(&mut self, level: PidLevel, value: impl Into<String>) {
        let value = Some(value.into());
        match level {
            PidLevel::Country => self.country_code = value.unwrap_or_default(),
            PidLevel::Admin1 => self.admin1 = value,
            PidLevel::Admin2 => self.admin2 = value,
            PidLevel::Locality => self.locality = value,
            PidLevel::Sublocality => self.sublocality = value,
            PidLevel::Block => self.block = value,
            PidLevel::Building => self.building = value,
            PidLevel::Unit => self.unit = value,
        }
    }

    /// Get the field for a given level; blank strings count as absent
    pub fn get(&self, level: PidLevel) -> Option<&str> {
        let value = match level {
            PidLevel::Country => Some(self.country_code.as_str()),
            PidLevel::Admin1 => self.admin1.as_deref(),
            PidLevel::Admin2 => self.admin2.as_deref(),
            PidLevel::Locality => self.locality.as_deref(),
            PidLevel::Sublocality => self.sublocality.as_deref(),
            PidLevel::Block => self.block.as_deref(),
            PidLevel::Building => self.building.as_deref(),
            PidLevel::Unit => self.unit.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}
