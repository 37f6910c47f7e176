// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: f64 = 19.0;
/// Latitude limit of the square Web Mercator world.
pub const MAX_LAT: f64 = 85.0511;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Rounds both axes to 6 decimal digits, the precision sent to the geocoder.
    pub fn rounded(&self) -> Self {
        let round = |v: f64| (v * 1e6).round() / 1e6;
        Self {
            lon: round(self.lon),
            lat: round(self.lat),
        }
    }

    pub fn is_on_map(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-MAX_LAT..=MAX_LAT).contains(&self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lon, self.lat)
    }
}

/// Screen position relative to the top-left corner of the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// --- Tile Addressing ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl TileCoords {
    /// Expands a `{z}/{x}/{y}` template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// A tile and the square it covers on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub coords: TileCoords,
    pub origin: Pixel,
    pub size: f64,
}

/// Camera over the Mercator world: what the user currently sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    /// Fractional zoom (e.g. 12.5)
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, MAX_ZOOM),
            width,
            height,
        }
    }

    fn scale(&self) -> f64 {
        2.0f64.powf(self.zoom)
    }

    /// Camera position in zoom-0 world pixels.
    fn camera(&self) -> (f64, f64) {
        (lon_to_x(self.center.lon, 0.0), lat_to_y(self.center.lat, 0.0))
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn pixel_to_coordinate(&self, pixel: Pixel) -> Coordinate {
        let (camera_x, camera_y) = self.camera();
        let scale = self.scale();
        let wx = camera_x + (pixel.x - self.width / 2.0) / scale;
        let wy = camera_y + (pixel.y - self.height / 2.0) / scale;
        Coordinate::new(x_to_lon(wx, 0.0), y_to_lat(wy, 0.0))
    }

    pub fn coordinate_to_pixel(&self, coordinate: Coordinate) -> Pixel {
        let (camera_x, camera_y) = self.camera();
        let scale = self.scale();
        Pixel::new(
            self.width / 2.0 + (lon_to_x(coordinate.lon, 0.0) - camera_x) * scale,
            self.height / 2.0 + (lat_to_y(coordinate.lat, 0.0) - camera_y) * scale,
        )
    }

    /// Drags the map by a screen delta, keeping the world inside the view.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (camera_x, camera_y) = self.camera();
        let scale = self.scale();
        let wx = clamp_axis(camera_x - dx / scale, (self.width / 2.0) / scale);
        let wy = clamp_axis(camera_y - dy / scale, (self.height / 2.0) / scale);
        self.center = Coordinate::new(x_to_lon(wx, 0.0), y_to_lat(wy, 0.0));
    }

    /// Zooms by `delta` wheel lines while keeping the point under `anchor` fixed.
    ///
    /// Returns false when the zoom is already at its limit.
    pub fn zoom_at(&mut self, anchor: Pixel, delta: f64) -> bool {
        let min_zoom = (self.width / TILE_SIZE).log2().max(0.0);
        let new_zoom = (self.zoom + delta * 0.2).clamp(min_zoom, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() <= 0.001 {
            return false;
        }

        let (camera_x, camera_y) = self.camera();
        let scale = self.scale();
        let new_scale = 2.0f64.powf(new_zoom);

        let mx = anchor.x - self.width / 2.0;
        let my = anchor.y - self.height / 2.0;

        let new_camera_x = clamp_axis(
            camera_x + mx / scale - mx / new_scale,
            (self.width / 2.0) / new_scale,
        );
        let new_camera_y = (camera_y + my / scale - my / new_scale).clamp(0.0, TILE_SIZE);

        self.center = Coordinate::new(x_to_lon(new_camera_x, 0.0), y_to_lat(new_camera_y, 0.0));
        self.zoom = new_zoom;
        true
    }

    /// Tiles needed to cover the view at the integer zoom level below `zoom`.
    pub fn visible_tiles(&self) -> Vec<TilePlacement> {
        let (camera_x, camera_y) = self.camera();
        let scale = self.scale();

        let z = self.zoom.floor().clamp(0.0, MAX_ZOOM) as u32;
        let num_tiles = 2i64.pow(z);
        let tile_size_z0 = TILE_SIZE / 2.0f64.powf(z as f64);

        let half_w = (self.width / 2.0) / scale;
        let half_h = (self.height / 2.0) / scale;

        let min_tx = ((camera_x - half_w) / tile_size_z0).floor() as i64;
        let max_tx = ((camera_x + half_w) / tile_size_z0).ceil() as i64;
        let min_ty = ((camera_y - half_h) / tile_size_z0).floor() as i64;
        let max_ty = ((camera_y + half_h) / tile_size_z0).ceil() as i64;

        let mut placements = Vec::new();
        for tx in min_tx.max(0)..=max_tx.min(num_tiles - 1) {
            for ty in min_ty.max(0)..=max_ty.min(num_tiles - 1) {
                let tile_world_x = tx as f64 * tile_size_z0;
                let tile_world_y = ty as f64 * tile_size_z0;
                placements.push(TilePlacement {
                    coords: TileCoords {
                        x: tx as u32,
                        y: ty as u32,
                        z,
                    },
                    origin: Pixel::new(
                        self.width / 2.0 + (tile_world_x - camera_x) * scale,
                        self.height / 2.0 + (tile_world_y - camera_y) * scale,
                    ),
                    size: tile_size_z0 * scale,
                });
            }
        }
        placements
    }
}

/// Keeps a camera axis within the world; centers it when the view is wider than the world.
fn clamp_axis(value: f64, half_view: f64) -> f64 {
    if half_view * 2.0 >= TILE_SIZE {
        TILE_SIZE / 2.0
    } else {
        value.clamp(half_view, TILE_SIZE - half_view)
    }
}
