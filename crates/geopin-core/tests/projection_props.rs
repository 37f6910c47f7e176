use geopin_core::geo::MAX_LAT;
use geopin_core::{Coordinate, Viewport};
use proptest::prelude::*;

proptest! {
    #[test]
    fn coordinate_survives_pixel_roundtrip(
        lon in -180.0f64..180.0,
        lat in -80.0f64..80.0,
        zoom in 0.0f64..19.0,
        center_lon in -179.0f64..179.0,
        center_lat in -MAX_LAT..MAX_LAT,
    ) {
        let view = Viewport::new(Coordinate::new(center_lon, center_lat), zoom, 1024.0, 768.0);
        let back = view.pixel_to_coordinate(view.coordinate_to_pixel(Coordinate::new(lon, lat)));
        prop_assert!((back.lon - lon).abs() < 1e-6, "lon {} -> {}", lon, back.lon);
        prop_assert!((back.lat - lat).abs() < 1e-6, "lat {} -> {}", lat, back.lat);
    }
}
