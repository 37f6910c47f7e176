// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{Coordinate, Pixel, Viewport};
use crate::geocode::{LocationInfo, ReverseGeocoder};
use crate::popup::{InfoPopup, InputPopup};
use crate::store::MarkerStore;
use crate::surface::{MapSurface, MarkerFeature};
use log::{debug, info, warn};

pub const MARKER_INFO_TITLE: &str = "Marker Information";
pub const ERROR_TITLE: &str = "Error";
pub const ERROR_MESSAGE: &str = "Unable to fetch location data.";

/// Handle for one reverse-geocode lookup started by a map click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTicket {
    pub generation: u64,
    pub coordinate: Coordinate,
    pub anchor: Pixel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Click landed on a saved marker; the info popup now shows it.
    MarkerInfo,
    /// Empty map: the caller must run the lookup and report back.
    Lookup(LookupTicket),
    /// Nothing to do (marker without details, or outside the world).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResolution {
    InputShown,
    ErrorShown,
    /// A newer click superseded this lookup; its result was dropped.
    Stale,
}

/// Owns every piece of session state and applies one UI event at a time.
pub struct InteractionController {
    surface: MapSurface,
    store: MarkerStore,
    info_popup: InfoPopup,
    input_popup: InputPopup,
    pending: Option<Coordinate>,
    list_view: Vec<String>,
    generation: u64,
}

impl InteractionController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            surface: MapSurface::new(viewport),
            store: MarkerStore::new(),
            info_popup: InfoPopup::default(),
            input_popup: InputPopup::default(),
            pending: None,
            list_view: Vec::new(),
            generation: 0,
        }
    }

    pub fn handle_click(&mut self, pixel: Pixel) -> ClickOutcome {
        if let Some(marker) = self.surface.hit_test(pixel) {
            if marker.description.is_empty() {
                return ClickOutcome::Ignored;
            }
            let message = format!(
                "Longitude: {}\nLatitude: {}\nDescription: {}",
                marker.coordinate.lon, marker.coordinate.lat, marker.description
            );
            let anchor = self.surface.coordinate_to_pixel(marker.coordinate);
            self.info_popup.show(MARKER_INFO_TITLE, message, anchor);
            return ClickOutcome::MarkerInfo;
        }

        let coordinate = self.surface.pixel_to_coordinate(pixel);
        if !coordinate.is_on_map() {
            debug!("Click outside the map — pixel=({}, {})", pixel.x, pixel.y);
            return ClickOutcome::Ignored;
        }

        // The open panel describes the previous click
        self.input_popup.cancel();
        self.pending = Some(coordinate);
        self.generation += 1;
        debug!(
            "Pending coordinate set — coordinate={} generation={}",
            coordinate, self.generation
        );
        ClickOutcome::Lookup(LookupTicket {
            generation: self.generation,
            coordinate,
            anchor: pixel,
        })
    }

    pub fn resolve_lookup(
        &mut self,
        ticket: LookupTicket,
        result: Option<LocationInfo>,
    ) -> LookupResolution {
        if ticket.generation != self.generation {
            debug!(
                "Dropping stale lookup — generation={} current={}",
                ticket.generation, self.generation
            );
            return LookupResolution::Stale;
        }

        match result {
            Some(info) => {
                self.input_popup.show(info, ticket.anchor);
                LookupResolution::InputShown
            }
            None => {
                warn!("Lookup failed — coordinate={}", ticket.coordinate);
                self.pending = None;
                self.info_popup.show(ERROR_TITLE, ERROR_MESSAGE, ticket.anchor);
                LookupResolution::ErrorShown
            }
        }
    }

    /// Click followed by a blocking lookup, for callers without an event loop.
    pub fn click_and_lookup(
        &mut self,
        pixel: Pixel,
        geocoder: &dyn ReverseGeocoder,
    ) -> ClickOutcome {
        let outcome = self.handle_click(pixel);
        if let ClickOutcome::Lookup(ticket) = outcome {
            let result = geocoder.lookup(ticket.coordinate);
            self.resolve_lookup(ticket, result);
        }
        outcome
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.input_popup.set_description(text);
    }

    /// Saves the pending location. Returns its 1-based index, or `None` when refused.
    pub fn save(&mut self) -> Option<usize> {
        let coordinate = self.pending?;
        let confirmed = self.input_popup.confirm()?;

        let index = self.store.append(
            coordinate,
            confirmed.description.clone(),
            confirmed.address.clone(),
        );
        self.surface.add_marker(MarkerFeature {
            coordinate,
            description: confirmed.description,
            address: confirmed.address,
        });
        self.refresh_list();
        self.pending = None;

        info!("Saved location — index={} coordinate={}", index, coordinate);
        Some(index)
    }

    pub fn cancel(&mut self) {
        self.input_popup.cancel();
        self.pending = None;
    }

    pub fn close_info(&mut self) {
        self.info_popup.hide();
    }

    fn refresh_list(&mut self) {
        self.list_view = self.store.all().iter().map(|r| r.list_entry()).collect();
    }

    pub fn list_view(&self) -> &[String] {
        &self.list_view
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn info_popup(&self) -> &InfoPopup {
        &self.info_popup
    }

    pub fn input_popup(&self) -> &InputPopup {
        &self.input_popup
    }

    pub fn pending(&self) -> Option<Coordinate> {
        self.pending
    }

    pub fn viewport(&self) -> &Viewport {
        self.surface.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.set_viewport(viewport);
    }
}
