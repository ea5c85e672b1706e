//! PID string codec.
//!
//! Wire format:
//! `<COUNTRY>[-<ADMIN1>-<ADMIN2>-<LOCALITY>-<SUBLOCALITY>-<BLOCK>-<BUILDING>-<UNIT>][-C<NN>]`
//!
//! The codec is purely structural. It knows nothing about which
//! districts exist in a country, so a well-formed PID for a place that
//! does not exist still decodes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{PidError, PidErrorCode, PidIssue};
use crate::models::{NormalizedAddress, PidComponents, PidLevel};

/// Component separator
pub const PID_SEPARATOR: char = '-';

/// Largest collision counter that fits the `C<NN>` suffix
pub const MAX_COLLISION_COUNTER: i64 = 99;

static ALLOWED_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("static regex"));
static COUNTRY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("static regex"));
static COMPONENT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("static regex"));
static COLLISION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C[0-9]{2}$").expect("static regex"));

/// Encoding options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Collision counter to append (1-99). Takes precedence over a
    /// collision already stored on the components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_counter: Option<i64>,
}

impl EncodeOptions {
    pub fn with_collision_counter(counter: i64) -> Self {
        Self {
            collision_counter: Some(counter),
        }
    }
}

/// Render a collision counter as its `C<NN>` suffix
pub fn collision_suffix(counter: i64) -> Result<String, PidError> {
    if !(1..=MAX_COLLISION_COUNTER).contains(&counter) {
        return Err(PidError::InvalidCollisionCounter(counter));
    }
    Ok(format!("C{:02}", counter))
}

/// Whether a single token is a collision suffix (case-insensitive)
pub fn is_collision_suffix(token: &str) -> bool {
    COLLISION_SUFFIX.is_match(&token.to_ascii_uppercase())
}

/// Split a PID into its positional path and trailing collision token
pub(crate) fn split_collision(pid: &str) -> (&str, Option<&str>) {
    match pid.rsplit_once(PID_SEPARATOR) {
        Some((path, last)) if is_collision_suffix(last) => (path, Some(last)),
        _ => (pid, None),
    }
}

/// Encode components into a PID string
pub fn encode(components: &PidComponents, options: &EncodeOptions) -> Result<String, PidError> {
    let mut pid = components
        .levels()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join("-");

    let suffix = match options.collision_counter {
        Some(counter) => Some(collision_suffix(counter)?),
        None => components.collision().map(str::to_string),
    };
    if let Some(suffix) = suffix {
        pid.push(PID_SEPARATOR);
        pid.push_str(&suffix);
    }

    Ok(pid)
}

impl TryFrom<&NormalizedAddress> for PidComponents {
    type Error = PidError;

    /// Walks the fixed level order and stops at the first blank field,
    /// even when deeper fields are filled in.
    fn try_from(address: &NormalizedAddress) -> Result<Self, Self::Error> {
        let country = address
            .get(PidLevel::Country)
            .ok_or(PidError::MissingCountry)?;
        let mut components = PidComponents::new(country)?;

        for level in PidLevel::below_country() {
            match address.get(*level) {
                Some(value) => components = components.with(*level, value)?,
                None => break,
            }
        }

        Ok(components)
    }
}

/// Generate a PID string from a normalized address
pub fn encode_address(
    address: &NormalizedAddress,
    options: &EncodeOptions,
) -> Result<String, PidError> {
    let components = PidComponents::try_from(address)?;
    encode(&components, options)
}

/// Decode a PID string into components.
///
/// Tokens map positionally onto the hierarchy; a trailing `C<NN>` token
/// becomes the collision suffix.
pub fn decode(pid: &str) -> Result<PidComponents, PidError> {
    if pid.is_empty() {
        return Err(PidError::EmptyPid);
    }

    let (path, collision) = split_collision(pid);
    let token_count = path.split(PID_SEPARATOR).count();
    if token_count > PidLevel::all().len() {
        return Err(PidError::ExcessComponents(token_count));
    }

    let mut tokens = path.split(PID_SEPARATOR);
    let country = tokens.next().unwrap_or_default();
    let mut components = PidComponents::new(country)?;

    for (token, level) in tokens.zip(PidLevel::below_country()) {
        if token.is_empty() {
            return Err(PidError::EmptyComponent(*level));
        }
        components = components.with(*level, token)?;
    }

    if let Some(collision) = collision {
        components = components.with_collision(collision);
    }

    Ok(components)
}

/// Outcome of a structural validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PidValidation {
    pub valid: bool,
    pub errors: Vec<PidIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<PidComponents>,
}

impl PidValidation {
    fn passed(components: PidComponents) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            components: Some(components),
        }
    }

    fn failed(errors: Vec<PidIssue>) -> Self {
        Self {
            valid: false,
            errors,
            components: None,
        }
    }

    /// Turn the validation into a `Result`, aggregating all issues
    pub fn into_result(self) -> Result<PidComponents, PidError> {
        match self.components {
            Some(components) if self.valid => Ok(components),
            _ => Err(PidError::Invalid(self.errors)),
        }
    }
}

/// Validate the structure of a PID string.
///
/// Emptiness and the character set short-circuit. Country and component
/// checks run together so every bad token is reported.
pub fn validate(pid: &str) -> PidValidation {
    if pid.is_empty() {
        return PidValidation::failed(vec![PidIssue::format(
            PidErrorCode::EmptyPid,
            "PID must be a non-empty string",
        )]);
    }

    if !ALLOWED_CHARACTERS.is_match(pid) {
        return PidValidation::failed(vec![PidIssue::format(
            PidErrorCode::InvalidCharacters,
            "PID can only contain alphanumeric characters and hyphens",
        )]);
    }

    let mut errors = Vec::new();
    let (path, _) = split_collision(pid);
    let tokens: Vec<&str> = path.split(PID_SEPARATOR).collect();

    if !COUNTRY_CODE.is_match(&tokens[0].to_ascii_uppercase()) {
        errors.push(PidIssue::at(
            PidLevel::Country,
            PidErrorCode::InvalidCountryCode,
            "Country code must be a valid ISO 3166-1 alpha-2 code (2 letters)",
        ));
    }

    for (index, token) in tokens.iter().enumerate().skip(1) {
        let Some(level) = PidLevel::from_position(index) else {
            errors.push(PidIssue::format(
                PidErrorCode::ExcessComponents,
                format!(
                    "PID has {} positional components, at most {} are allowed",
                    tokens.len(),
                    PidLevel::all().len()
                ),
            ));
            break;
        };

        if !COMPONENT_CODE.is_match(&token.to_ascii_uppercase()) {
            errors.push(PidIssue::at(
                level,
                PidErrorCode::InvalidComponentCode,
                format!("{} code must be alphanumeric: '{}'", level, token),
            ));
        }
    }

    if !errors.is_empty() {
        return PidValidation::failed(errors);
    }

    match decode(pid) {
        Ok(components) => PidValidation::passed(components),
        Err(e) => PidValidation::failed(vec![PidIssue::format(
            PidErrorCode::ParseError,
            format!("Failed to parse PID components: {}", e),
        )]),
    }
}

/// A structurally validated PID and its components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AddressPid {
    pid: String,
    components: PidComponents,
    validated: bool,
}

impl AddressPid {
    /// Encode components and validate the resulting string
    pub fn create(components: &PidComponents, options: &EncodeOptions) -> Result<Self, PidError> {
        let pid = encode(components, options)?;
        let components = validate(&pid).into_result()?;
        Ok(Self {
            pid,
            components,
            validated: true,
        })
    }

    /// Parse and validate a PID string
    pub fn parse(pid: &str) -> Result<Self, PidError> {
        let components = validate(pid).into_result()?;
        Ok(Self {
            pid: pid.to_ascii_uppercase(),
            components,
            validated: true,
        })
    }

    /// New PID with the collision suffix set (or replaced)
    pub fn with_collision_counter(&self, counter: i64) -> Result<Self, PidError> {
        Self::create(
            &self.components,
            &EncodeOptions::with_collision_counter(counter),
        )
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn components(&self) -> &PidComponents {
        &self.components
    }

    pub fn validated(&self) -> bool {
        self.validated
    }
}

impl std::fmt::Display for AddressPid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pid)
    }
}

impl std::str::FromStr for AddressPid {
    type Err = PidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
