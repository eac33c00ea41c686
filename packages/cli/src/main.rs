#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for outdoor space detection.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use touch_grass_detector::analyze_outdoor_space;
use touch_grass_location::{
    IpGeolocationService, LocationPreference, LocationPreferences, get_ip_based_location,
    resolve_location,
};
use touch_grass_places::lookup::{GooglePlacesLookup, StaticPlaceLookup};
use touch_grass_places::{BoundaryAnalyzer, Calibration, PlacesAnalyzer};

#[derive(Parser)]
#[command(name = "touch-grass", about = "Outdoor space detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify whether a coordinate is in an outdoor space
    Classify {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// TOML file of `[[places]]` records to classify against
        #[arg(long, conflicts_with = "google")]
        places: Option<PathBuf>,
        /// Look up nearby places with Google Places (needs `GOOGLE_MAPS_API_KEY`)
        #[arg(long)]
        google: bool,
        /// TOML file overriding the embedded confidence calibration
        #[arg(long)]
        calibration: Option<PathBuf>,
        /// Force an outdoor result without looking anything up
        #[arg(long)]
        manual_override: bool,
    },
    /// Acquire the current location using the stored preference
    Locate {
        /// Use IP geolocation and store it as the preference
        #[arg(long)]
        ip: bool,
    },
    /// Inspect or change the stored location preference
    Preference {
        #[command(subcommand)]
        action: PreferenceAction,
    },
}

#[derive(Subcommand)]
enum PreferenceAction {
    /// Print the stored preference
    Get,
    /// Store a preference (`precise` or `ip`)
    Set { value: LocationPreference },
    /// Remove the stored preference
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            lat,
            lng,
            places,
            google,
            calibration,
            manual_override,
        } => {
            let calibration = load_calibration(calibration.as_deref())?;
            let analyzer: Box<dyn BoundaryAnalyzer<Map = ()>> = if google {
                let lookup = GooglePlacesLookup::from_env(reqwest::Client::new())?;
                log::info!("Looking up places with {}", lookup.service().name);
                Box::new(PlacesAnalyzer::with_calibration(lookup, calibration))
            } else {
                let lookup = match places {
                    Some(path) => StaticPlaceLookup::from_file(&path)?,
                    None => {
                        if !manual_override {
                            log::warn!("No place source given; classifying against no places");
                        }
                        StaticPlaceLookup::default()
                    }
                };
                Box::new(PlacesAnalyzer::with_calibration(lookup, calibration))
            };

            let result = analyze_outdoor_space(analyzer.as_ref(), lat, lng, &(), manual_override).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Locate { ip } => {
            let preferences = LocationPreferences::open_default();
            let client = reqwest::Client::new();
            let service = IpGeolocationService::from_env();

            let location = if ip {
                get_ip_based_location(&preferences, &client, &service).await?
            } else if let Some(location) =
                resolve_location(&preferences, &client, &service, None).await?
            {
                location
            } else {
                log::info!("No location preference stored, falling back to IP geolocation");
                get_ip_based_location(&preferences, &client, &service).await?
            };

            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Commands::Preference { action } => {
            let preferences = LocationPreferences::open_default();
            match action {
                PreferenceAction::Get => match preferences.get_location_preference() {
                    Some(preference) => println!("{preference}"),
                    None => println!("(not set)"),
                },
                PreferenceAction::Set { value } => {
                    preferences.set_location_preference(Some(value))?;
                    println!("Location preference set to {value}");
                }
                PreferenceAction::Clear => {
                    preferences.set_location_preference(None)?;
                    println!("Location preference cleared");
                }
            }
        }
    }

    Ok(())
}

fn load_calibration(path: Option<&Path>) -> Result<Calibration, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Calibration::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let calibration = Calibration::from_toml_str(&contents)?;
    log::info!("Loaded confidence calibration from {}", path.display());
    Ok(calibration)
}
