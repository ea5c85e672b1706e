//! Command line front end for the PID codec and geo-verification.

mod batch;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use placeid::geo::{
    convert_coordinate_format, parse_coordinates, verify_address_with_geo, CoordinateFormat,
    VerifyOptions,
};
use placeid::models::{GeoAddress, GeoCoordinates, NormalizedAddress, PidLevel, WaybillExtras};
use placeid::pid::{encode_address, validate, AddressPid, EncodeOptions};
use placeid::{create_waybill_payload, Config};

use crate::batch::{load_claims, verify_claims, write_outcomes};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "pidctl")]
#[command(about = "Encode, validate and geo-verify address PIDs")]
struct Args {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode address components into a PID
    Encode(EncodeArgs),

    /// Check a PID's structure
    Validate {
        pid: String,
    },

    /// Verify an observed point against an address center
    Verify {
        #[arg(long)]
        pid: String,

        /// Address center as "lat, lon"
        #[arg(long)]
        center: String,

        /// Observed point as "lat, lon"
        #[arg(long)]
        observed: String,

        /// Observation accuracy radius in meters
        #[arg(long)]
        accuracy: Option<f64>,

        /// Tolerance in meters (overrides the config file)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Render "lat, lon" as decimal, dms or dmm
    Convert {
        coordinates: String,

        #[arg(short, long, default_value = "decimal")]
        format: String,
    },

    /// Build a waybill payload for a PID
    Waybill {
        pid: String,

        /// Waybill id (random when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Parcel weight in kg
        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        zone: Option<String>,
    },

    /// Verify a CSV of claims in parallel
    Batch {
        /// CSV with pid,center_lat,center_lon,observed_lat,observed_lon[,accuracy]
        file: PathBuf,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Tolerance in meters (overrides the config file)
        #[arg(long)]
        tolerance: Option<f64>,
    },
}

#[derive(ClapArgs, Debug)]
struct EncodeArgs {
    /// ISO 3166-1 alpha-2 country code
    #[arg(long)]
    country: String,
    #[arg(long)]
    admin1: Option<String>,
    #[arg(long)]
    admin2: Option<String>,
    #[arg(long)]
    locality: Option<String>,
    #[arg(long)]
    sublocality: Option<String>,
    #[arg(long)]
    block: Option<String>,
    #[arg(long)]
    building: Option<String>,
    #[arg(long)]
    unit: Option<String>,

    /// Collision counter (1-99)
    #[arg(long)]
    collision: Option<i64>,
}

impl EncodeArgs {
    fn to_address(&self) -> NormalizedAddress {
        let mut address = NormalizedAddress::new(&self.country);
        let fields = [
            (PidLevel::Admin1, &self.admin1),
            (PidLevel::Admin2, &self.admin2),
            (PidLevel::Locality, &self.locality),
            (PidLevel::Sublocality, &self.sublocality),
            (PidLevel::Block, &self.block),
            (PidLevel::Building, &self.building),
            (PidLevel::Unit, &self.unit),
        ];
        for (level, value) in fields {
            if let Some(value) = value {
                address.set(level, value.as_str());
            }
        }
        address
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = config.verification;

    match args.command {
        Command::Encode(encode) => {
            let address = encode.to_address();
            let pid = encode_address(
                &address,
                &EncodeOptions {
                    collision_counter: encode.collision,
                },
            )?;
            println!("{}", pid);
        }
        Command::Validate { pid } => {
            let validation = validate(&pid);
            if !validation.valid {
                for issue in &validation.errors {
                    eprintln!("{}: {}", issue.code, issue.message);
                }
                bail!("{} is not a valid PID", pid);
            }
            println!("{}", serde_json::to_string_pretty(&validation)?);
        }
        Command::Verify {
            pid,
            center,
            observed,
            accuracy,
            tolerance,
        } => {
            let center = parse_coordinates(&center)
                .with_context(|| format!("Invalid center coordinates: {}", center))?;
            let mut observed_point = parse_coordinates(&observed)
                .with_context(|| format!("Invalid observed coordinates: {}", observed))?;
            if let Some(accuracy) = accuracy {
                observed_point = observed_point.with_accuracy(accuracy)?;
            }

            let options = with_tolerance_override(options, tolerance);
            let address = claimed_address(&pid, center)?;
            let verification = verify_address_with_geo(&address, &observed_point, &options);
            debug!("{:?}", verification);
            println!("{}", serde_json::to_string_pretty(&verification)?);
        }
        Command::Convert {
            coordinates,
            format,
        } => {
            let parsed = parse_coordinates(&coordinates)
                .with_context(|| format!("Invalid coordinates: {}", coordinates))?;
            println!(
                "{}",
                convert_coordinate_format(&parsed, CoordinateFormat::from_name(&format))
            );
        }
        Command::Waybill {
            pid,
            id,
            weight,
            size,
            zone,
        } => {
            let waybill_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let extras = WaybillExtras {
                parcel_weight: weight,
                parcel_size: size,
                carrier_zone: zone,
                ..Default::default()
            };
            let payload = create_waybill_payload(waybill_id, &pid, extras)?;
            println!("{}", payload.to_json()?);
        }
        Command::Batch {
            file,
            output,
            tolerance,
        } => {
            let options = with_tolerance_override(options, tolerance);
            info!("Batch verification of {}", file.display());

            let claims = load_claims(&file)?;
            let outcomes = verify_claims(claims, &options);
            write_outcomes(&outcomes, output.as_deref())?;
        }
    }

    Ok(())
}

/// Pair a claimed PID with its center; the PID must be structurally valid
fn claimed_address(pid: &str, center: GeoCoordinates) -> Result<GeoAddress> {
    let pid = AddressPid::parse(pid)?;
    let address = GeoAddress::new(&pid, center, None)?;
    Ok(address)
}

fn with_tolerance_override(options: VerifyOptions, tolerance: Option<f64>) -> VerifyOptions {
    match tolerance {
        Some(tolerance_meters) => VerifyOptions {
            tolerance_meters,
            ..options
        },
        None => options,
    }
}
