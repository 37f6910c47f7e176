use crate::geo::{Coordinate, Pixel, Viewport};
use serde::Serialize;

/// Marker glyph size on screen: a 512px icon drawn at 0.08 scale.
pub const MARKER_ICON_SIZE: f64 = 512.0 * 0.08;

/// The visual copy of a saved location kept on the map for drawing and hit-testing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFeature {
    pub coordinate: Coordinate,
    pub description: String,
    pub address: String,
}

impl MarkerFeature {
    /// Whether `pixel` lands on the icon, which is anchored at its bottom-centre.
    fn covers(&self, viewport: &Viewport, pixel: Pixel) -> bool {
        let tip = viewport.coordinate_to_pixel(self.coordinate);
        let half = MARKER_ICON_SIZE / 2.0;
        pixel.x >= tip.x - half
            && pixel.x <= tip.x + half
            && pixel.y >= tip.y - MARKER_ICON_SIZE
            && pixel.y <= tip.y
    }
}

pub struct MapSurface {
    viewport: Viewport,
    markers: Vec<MarkerFeature>,
}

impl MapSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            markers: Vec::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn pixel_to_coordinate(&self, pixel: Pixel) -> Coordinate {
        self.viewport.pixel_to_coordinate(pixel)
    }

    pub fn coordinate_to_pixel(&self, coordinate: Coordinate) -> Pixel {
        self.viewport.coordinate_to_pixel(coordinate)
    }

    /// Topmost marker under `pixel`. Later markers are drawn above earlier ones.
    pub fn hit_test(&self, pixel: Pixel) -> Option<&MarkerFeature> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.covers(&self.viewport, pixel))
    }

    pub fn add_marker(&mut self, marker: MarkerFeature) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[MarkerFeature] {
        &self.markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> MapSurface {
        MapSurface::new(Viewport::new(Coordinate::new(0.0, 0.0), 10.0, 400.0, 400.0))
    }

    fn marker(coordinate: Coordinate, description: &str) -> MarkerFeature {
        MarkerFeature {
            coordinate,
            description: description.to_string(),
            address: String::new(),
        }
    }

    #[test]
    fn test_hit_test_uses_icon_box_above_tip() {
        let mut s = surface();
        s.add_marker(marker(Coordinate::new(0.0, 0.0), "origin"));

        // Tip sits at the view centre; the icon extends upwards from it
        assert!(s.hit_test(Pixel::new(200.0, 180.0)).is_some());
        assert!(s.hit_test(Pixel::new(215.0, 199.0)).is_some());
        assert!(s.hit_test(Pixel::new(200.0, 210.0)).is_none());
        assert!(s.hit_test(Pixel::new(240.0, 180.0)).is_none());
    }

    #[test]
    fn test_hit_test_returns_topmost() {
        let mut s = surface();
        s.add_marker(marker(Coordinate::new(0.0, 0.0), "first"));
        s.add_marker(marker(Coordinate::new(0.0, 0.0), "second"));

        let hit = s.hit_test(Pixel::new(200.0, 190.0)).unwrap();
        assert_eq!(hit.description, "second");
        assert_eq!(s.markers().len(), 2);
    }

    #[test]
    fn test_empty_surface_has_no_hits() {
        assert!(surface().hit_test(Pixel::new(200.0, 190.0)).is_none());
    }
}
