//! Bulk verification of address claims from CSV.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use placeid::geo::{verify_batch, GeoVerification, VerificationMethod, VerifyOptions};
use placeid::models::{GeoAddress, GeoCoordinates};
use placeid::ValidationCache;

/// Claims verified per progress tick
const CHUNK_SIZE: usize = 1024;

/// One input row: a claimed address and the point observed for it
#[derive(Debug, Deserialize)]
pub struct ClaimRecord {
    pub pid: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub observed_lat: f64,
    pub observed_lon: f64,
    /// Observation accuracy radius in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl ClaimRecord {
    fn into_pair(self) -> (GeoAddress, GeoCoordinates) {
        let mut observed = GeoCoordinates::unchecked(self.observed_lat, self.observed_lon);
        observed.accuracy = self.accuracy;

        let address = GeoAddress {
            pid: self.pid,
            center: GeoCoordinates::unchecked(self.center_lat, self.center_lon),
            bounds: None,
            verified: false,
            verified_at: None,
        };
        (address, observed)
    }
}

/// One output row
#[derive(Debug, Serialize, PartialEq)]
pub struct OutcomeRecord {
    pub pid: String,
    pub pid_valid: bool,
    pub valid: bool,
    pub within_tolerance: bool,
    pub distance: Option<f64>,
    pub confidence: f64,
    pub method: &'static str,
}

impl OutcomeRecord {
    fn new(pid: String, pid_valid: bool, verification: &GeoVerification) -> Self {
        Self {
            pid,
            pid_valid,
            valid: verification.valid,
            within_tolerance: verification.within_tolerance,
            distance: verification.distance,
            confidence: verification.confidence,
            method: match verification.method {
                VerificationMethod::Bounds => "bounds",
                VerificationMethod::Center => "center",
            },
        }
    }
}

/// Load claims from a CSV file with a header row
pub fn load_claims(path: &Path) -> Result<Vec<ClaimRecord>> {
    info!("Loading claims from {}", path.display());

    let file = File::open(path).context("Failed to open claims file")?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut claims = Vec::new();
    for (line, result) in reader.deserialize::<ClaimRecord>().enumerate() {
        match result {
            Ok(claim) => claims.push(claim),
            // Header is line 1
            Err(e) => warn!("Skipping malformed row {}: {}", line + 2, e),
        }
    }

    info!("Loaded {} claims", claims.len());
    Ok(claims)
}

/// Verify every claim in parallel, tracking progress
pub fn verify_claims(claims: Vec<ClaimRecord>, options: &VerifyOptions) -> Vec<OutcomeRecord> {
    let cache = ValidationCache::new();
    let pb = ProgressBar::new(claims.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let pairs: Vec<(GeoAddress, GeoCoordinates)> =
        claims.into_iter().map(ClaimRecord::into_pair).collect();

    let mut outcomes = Vec::with_capacity(pairs.len());
    for chunk in pairs.chunks(CHUNK_SIZE) {
        let verifications = verify_batch(chunk, options);
        for ((address, _), verification) in chunk.iter().zip(&verifications) {
            let pid_valid = cache.validate(&address.pid).valid;
            outcomes.push(OutcomeRecord::new(address.pid.clone(), pid_valid, verification));
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    let passed = outcomes.iter().filter(|o| o.valid && o.pid_valid).count();
    info!(
        "Verified {} claims: {} passed, {} distinct PIDs",
        outcomes.len(),
        passed,
        cache.len()
    );
    outcomes
}

/// Write outcomes as CSV to `path`, or stdout when absent
pub fn write_outcomes(outcomes: &[OutcomeRecord], path: Option<&Path>) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(File::create(path).context("Failed to create output file")?),
        None => Box::new(io::stdout().lock()),
    };

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    for outcome in outcomes {
        writer.serialize(outcome)?;
    }
    writer.flush()?;
    Ok(())
}
