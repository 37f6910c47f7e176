// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use geopin_core::config::Settings;
use geopin_core::controller::{ClickOutcome, LookupResolution};
use geopin_core::geo::TileCoords;
use geopin_core::{
    Coordinate, InteractionController, NominatimClient, Pixel, ReverseGeocoder, Viewport,
};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Reverse geocoding endpoint (overrides settings.json)
    #[arg(long, env = "GEOPIN_GEOCODER_URL")]
    endpoint: Option<String>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address block for a coordinate
    Lookup {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
    /// Show where a coordinate lands on screen and which tile holds it
    Project {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long)]
        zoom: Option<f64>,
        #[arg(long, default_value_t = 1024.0)]
        width: f64,
        #[arg(long, default_value_t = 768.0)]
        height: f64,
    },
    /// Drop a marker, describe it, and print the saved list
    Annotate {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long)]
        description: String,
        /// Print the saved records as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(endpoint) = cli.endpoint {
        settings.geocoder.endpoint = endpoint;
    }

    match cli.command {
        Commands::Lookup { lon, lat } => {
            let client = NominatimClient::new(&settings.geocoder)?;
            let info = client.try_lookup(Coordinate::new(lon, lat))?;
            println!("{}", info.summary());
            if let Some(name) = info.display_name {
                println!("\n{}", name);
            }
        }
        Commands::Project {
            lon,
            lat,
            zoom,
            width,
            height,
        } => {
            let zoom = zoom.unwrap_or(settings.map.zoom);
            let view = Viewport::new(settings.map.center, zoom, width, height);
            let coordinate = Coordinate::new(lon, lat);
            let pixel = view.coordinate_to_pixel(coordinate);
            println!(
                "Center {} at zoom {:.2} ({}x{})",
                view.center, view.zoom, width, height
            );
            println!("{} -> pixel ({:.1}, {:.1})", coordinate, pixel.x, pixel.y);
            println!("Back: {}", view.pixel_to_coordinate(pixel));
            if let Some(tile) = tile_for(coordinate, zoom) {
                println!("Tile: {}", tile.url(&settings.map.tile_url));
            }
        }
        Commands::Annotate {
            lon,
            lat,
            description,
            json,
        } => {
            let client = NominatimClient::new(&settings.geocoder)?;
            let controller = annotate(
                &client,
                Coordinate::new(lon, lat),
                &description,
                settings.map.zoom,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(controller.store().all())?);
            } else {
                for entry in controller.list_view() {
                    println!("{}\n", entry);
                }
            }
        }
    }

    Ok(())
}

/// Runs one click-describe-save round against a viewport centred on `coordinate`.
fn annotate(
    geocoder: &dyn ReverseGeocoder,
    coordinate: Coordinate,
    description: &str,
    zoom: f64,
) -> Result<InteractionController> {
    let view = Viewport::new(coordinate, zoom, 800.0, 600.0);
    let mut controller = InteractionController::new(view);
    let click = Pixel::new(view.width / 2.0, view.height / 2.0);

    let ticket = match controller.handle_click(click) {
        ClickOutcome::Lookup(ticket) => ticket,
        _ => bail!("Coordinate {} is outside the map", coordinate),
    };
    let result = geocoder.lookup(ticket.coordinate);
    if controller.resolve_lookup(ticket, result) != LookupResolution::InputShown {
        bail!("Unable to fetch location data.");
    }

    controller.set_description(description);
    if controller.save().is_none() {
        bail!("Description must not be empty");
    }
    Ok(controller)
}

fn tile_for(coordinate: Coordinate, zoom: f64) -> Option<TileCoords> {
    if !coordinate.is_on_map() {
        return None;
    }
    let z = zoom.floor().clamp(0.0, geopin_core::geo::MAX_ZOOM) as u32;
    let n = 2u32.pow(z);
    let x = geopin_core::geo::lon_to_x(coordinate.lon, z as f64) / geopin_core::geo::TILE_SIZE;
    let y = geopin_core::geo::lat_to_y(coordinate.lat, z as f64) / geopin_core::geo::TILE_SIZE;
    Some(TileCoords {
        x: (x as u32).min(n - 1),
        y: (y as u32).min(n - 1),
        z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopin_core::geocode::parse_response;
    use geopin_core::LocationInfo;

    struct Canned;

    impl ReverseGeocoder for Canned {
        fn lookup(&self, coordinate: Coordinate) -> Option<LocationInfo> {
            parse_response(coordinate.rounded(), r#"{"address":{"city":"Bandung"}}"#).ok()
        }
    }

    struct Down;

    impl ReverseGeocoder for Down {
        fn lookup(&self, _coordinate: Coordinate) -> Option<LocationInfo> {
            None
        }
    }

    #[test]
    fn test_annotate_saves_one_record() {
        let c = annotate(&Canned, Coordinate::new(107.901982, -7.215908), "Home", 12.0).unwrap();
        assert_eq!(c.store().len(), 1);
        assert!(c.list_view()[0].contains("Description: Home"));
    }

    #[test]
    fn test_annotate_reports_failures() {
        let c = Coordinate::new(107.901982, -7.215908);
        assert!(annotate(&Down, c, "Home", 12.0).is_err());
        assert!(annotate(&Canned, c, "  ", 12.0).is_err());
    }

    #[test]
    fn test_tile_for() {
        let tile = tile_for(Coordinate::new(0.1, 0.1), 1.0).unwrap();
        assert_eq!(tile, TileCoords { x: 1, y: 0, z: 1 });
        assert!(tile_for(Coordinate::new(0.0, 89.0), 3.0).is_none());
    }

    #[test]
    fn test_cli_parses_negative_latitude() {
        let cli =
            Cli::try_parse_from(["geopin-cli", "lookup", "--lon", "107.9", "--lat", "-7.2"])
                .unwrap();
        match cli.command {
            Commands::Lookup { lon, lat } => {
                assert_eq!(lon, 107.9);
                assert_eq!(lat, -7.2);
            }
            _ => panic!("expected lookup"),
        }
    }
}
