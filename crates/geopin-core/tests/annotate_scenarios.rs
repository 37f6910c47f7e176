use geopin_core::controller::{ClickOutcome, ERROR_MESSAGE, ERROR_TITLE};
use geopin_core::geocode::parse_response;
use geopin_core::popup::InfoState;
use geopin_core::{Coordinate, InteractionController, LocationInfo, Pixel, ReverseGeocoder, Viewport};

const ASIA_AFRIKA: &str = r#"{"address":{"road":"Jl. Asia Afrika","city":"Bandung","state":"Jawa Barat","country":"Indonesia"}}"#;

struct CannedGeocoder(&'static str);

impl ReverseGeocoder for CannedGeocoder {
    fn lookup(&self, coordinate: Coordinate) -> Option<LocationInfo> {
        parse_response(coordinate.rounded(), self.0).ok()
    }
}

struct OfflineGeocoder;

impl ReverseGeocoder for OfflineGeocoder {
    fn lookup(&self, _coordinate: Coordinate) -> Option<LocationInfo> {
        None
    }
}

fn centered_on_click() -> (InteractionController, Pixel) {
    let view = Viewport::new(Coordinate::new(107.901982, -7.215908), 12.0, 800.0, 600.0);
    (InteractionController::new(view), Pixel::new(400.0, 300.0))
}

#[test]
fn test_click_geocode_save_bandung() {
    let (mut c, click) = centered_on_click();

    let outcome = c.click_and_lookup(click, &CannedGeocoder(ASIA_AFRIKA));
    assert!(matches!(outcome, ClickOutcome::Lookup(_)));

    let panel = c.input_popup().panel().expect("input popup should be open");
    let block = panel.info.summary();
    assert!(block.contains("Jl. Asia Afrika"));
    assert!(block.contains("Bandung"));
    assert_eq!(panel.anchor, click);

    c.set_description("Home");
    assert_eq!(c.save(), Some(1));

    let records = c.store().all();
    assert_eq!(records.len(), 1);
    assert!((records[0].coordinate.lon - 107.901982).abs() < 1e-6);
    assert!((records[0].coordinate.lat - -7.215908).abs() < 1e-6);
    assert_eq!(records[0].description, "Home");
    assert!(records[0].address.contains("Jl. Asia Afrika"));

    assert_eq!(c.list_view().len(), 1);
    assert!(c.list_view()[0].starts_with("Location 1:"));
    assert!(c.list_view()[0].contains("Description: Home"));

    assert!(!c.input_popup().is_visible());
    assert_eq!(c.pending(), None);
    assert_eq!(c.store().len(), c.surface().markers().len());
}

#[test]
fn test_failed_lookup_shows_error_and_blocks_save() {
    let (mut c, click) = centered_on_click();

    c.click_and_lookup(click, &OfflineGeocoder);

    assert_eq!(
        c.info_popup().state(),
        &InfoState::Visible {
            title: ERROR_TITLE.to_string(),
            message: ERROR_MESSAGE.to_string(),
            anchor: click,
        }
    );
    assert_eq!(c.pending(), None);

    c.set_description("Home");
    assert_eq!(c.save(), None);
    assert!(c.store().is_empty());
}

#[test]
fn test_blank_description_keeps_popup_open() {
    let (mut c, click) = centered_on_click();
    c.click_and_lookup(click, &CannedGeocoder(ASIA_AFRIKA));

    c.set_description("   ");
    assert_eq!(c.save(), None);
    assert!(c.input_popup().is_visible());
    assert!(c.store().is_empty());

    c.set_description(" Home  ");
    assert_eq!(c.save(), Some(1));
    assert_eq!(c.store().all()[0].description, "Home");
}

#[test]
fn test_list_follows_save_order() {
    let (mut c, _) = centered_on_click();

    for (pixel, description) in [
        (Pixel::new(100.0, 500.0), "One"),
        (Pixel::new(700.0, 100.0), "Two"),
    ] {
        let outcome = c.click_and_lookup(pixel, &CannedGeocoder(ASIA_AFRIKA));
        assert!(matches!(outcome, ClickOutcome::Lookup(_)));
        c.set_description(description);
        assert!(c.save().is_some());
    }

    assert_eq!(c.store().len(), 2);
    assert_eq!(c.surface().markers().len(), 2);
    assert_eq!(c.list_view()[0].lines().next(), Some("Location 1:"));
    assert_eq!(c.list_view()[1].lines().next(), Some("Location 2:"));
    assert!(c.list_view()[1].contains("Description: Two"));
}
