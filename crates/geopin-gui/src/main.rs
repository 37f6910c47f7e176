// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use geopin_core::config::Settings;
use geopin_core::controller::{ClickOutcome, LookupResolution, LookupTicket};
use geopin_core::popup::InfoState;
use geopin_core::{
    Coordinate, InteractionController, LocationInfo, NominatimClient, Pixel, ReverseGeocoder,
    Viewport,
};
use iced::widget::{
    button, column, container, horizontal_space, row, scrollable, stack, text, text_input, Column,
    Space,
};
use iced::{Element, Length, Subscription, Task, Theme};
use log::{error, info, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::sync::Arc;
use std::time::Duration;

mod map;
mod style;
use map::{ImageCache, MapView};

const POPUP_WIDTH: f32 = 300.0;
const SIDEBAR_WIDTH: f32 = 320.0;

fn main() -> anyhow::Result<()> {
    init_logging();

    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Could not read settings, using defaults — error={}", e);
        Settings::default()
    });
    let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(NominatimClient::new(&settings.geocoder)?);

    iced::application("GeoPin", App::update, App::view)
        .theme(|_| Theme::Dark)
        .subscription(App::subscription)
        .run_with(move || App::new(settings, geocoder))?;
    Ok(())
}

fn init_logging() {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    let log_dir = geopin_core::get_config_root();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        if let Ok(file) = std::fs::File::create(log_dir.join("geopin.log")) {
            loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
        }
    }

    // Only fails if a logger is already set
    let _ = CombinedLogger::init(loggers);
}

#[derive(Debug, Clone)]
pub enum Message {
    MapClicked { pixel: Pixel, viewport: Viewport },
    MapMoved { center: Coordinate, zoom: f64 },
    LookupFinished(LookupTicket, Option<LocationInfo>),
    DescriptionChanged(String),
    SaveLocation,
    CancelLocation,
    CloseInfo,
    // Redraw while tiles are still arriving
    Tick,
}

struct App {
    controller: InteractionController,
    geocoder: Arc<dyn ReverseGeocoder>,
    settings: Settings,
    images: ImageCache,
    status: String,
}

impl App {
    fn new(settings: Settings, geocoder: Arc<dyn ReverseGeocoder>) -> (Self, Task<Message>) {
        let viewport = Viewport::new(settings.map.center, settings.map.zoom, 1024.0, 768.0);
        let app = Self {
            controller: InteractionController::new(viewport),
            geocoder,
            images: ImageCache::new(settings.geocoder.user_agent.clone()),
            settings,
            status: "Click the map to add a location".to_string(),
        };
        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::MapMoved { center, zoom } => {
                let mut viewport = *self.controller.viewport();
                viewport.center = center;
                viewport.zoom = zoom;
                self.controller.set_viewport(viewport);
                Task::none()
            }
            Message::MapClicked { pixel, viewport } => {
                let Some(ticket) = self.start_lookup(pixel, viewport) else {
                    return Task::none();
                };
                let geocoder = Arc::clone(&self.geocoder);
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || geocoder.lookup(ticket.coordinate))
                            .await
                            .unwrap_or(None)
                    },
                    move |result| Message::LookupFinished(ticket, result),
                )
            }
            Message::LookupFinished(ticket, result) => {
                self.status = match self.controller.resolve_lookup(ticket, result) {
                    LookupResolution::InputShown => "Describe this location".to_string(),
                    LookupResolution::ErrorShown => "Lookup failed".to_string(),
                    LookupResolution::Stale => return Task::none(),
                };
                Task::none()
            }
            Message::DescriptionChanged(value) => {
                self.controller.set_description(value);
                Task::none()
            }
            Message::SaveLocation => {
                if let Some(index) = self.controller.save() {
                    info!("Location {} added to list", index);
                    self.status = format!("{} saved locations", self.controller.store().len());
                }
                Task::none()
            }
            Message::CancelLocation => {
                self.controller.cancel();
                self.status = "Click the map to add a location".to_string();
                Task::none()
            }
            Message::CloseInfo => {
                self.controller.close_info();
                Task::none()
            }
            Message::Tick => Task::none(),
        }
    }

    /// Applies a map click; returns the ticket when the click needs a lookup.
    fn start_lookup(&mut self, pixel: Pixel, viewport: Viewport) -> Option<LookupTicket> {
        self.controller.set_viewport(viewport);
        match self.controller.handle_click(pixel) {
            ClickOutcome::Lookup(ticket) => {
                self.status = format!("Looking up {}...", ticket.coordinate.rounded());
                Some(ticket)
            }
            ClickOutcome::MarkerInfo | ClickOutcome::Ignored => None,
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.images.has_pending() {
            iced::time::every(Duration::from_millis(250)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let map: Element<'_, Message> = MapView {
            viewport: *self.controller.viewport(),
            markers: self.controller.surface().markers(),
            images: &self.images,
            tile_url: &self.settings.map.tile_url,
            marker_icon_url: &self.settings.map.marker_icon_url,
        }
        .into();

        let mut layers = vec![map];
        if let Some(panel) = self.view_input_popup() {
            layers.push(panel);
        }
        if let Some(panel) = self.view_info_popup() {
            layers.push(panel);
        }

        let map_area = container(stack(layers))
            .width(Length::Fill)
            .height(Length::Fill);

        row![map_area, self.view_location_list()].into()
    }

    fn view_info_popup(&self) -> Option<Element<'_, Message>> {
        let InfoState::Visible {
            title,
            message,
            anchor,
        } = self.controller.info_popup().state()
        else {
            return None;
        };

        let panel = container(
            column![
                row![
                    text(title.as_str()).size(16),
                    horizontal_space(),
                    button(text("×").size(16))
                        .on_press(Message::CloseInfo)
                        .style(style::button_close),
                ],
                text(message.as_str()).size(13),
            ]
            .spacing(8),
        )
        .padding(12)
        .width(POPUP_WIDTH)
        .style(style::container_popup);

        Some(anchored(*anchor, panel.into()))
    }

    fn view_input_popup(&self) -> Option<Element<'_, Message>> {
        let popup = self.controller.input_popup();
        let input = popup.panel()?;
        let can_save = !popup.description().trim().is_empty();

        let panel = container(
            column![
                text(input.info.summary()).size(13),
                text_input("Describe this location", popup.description())
                    .on_input(Message::DescriptionChanged)
                    .on_submit(Message::SaveLocation)
                    .padding(6)
                    .style(style::input_description),
                row![
                    button(text("Save"))
                        .on_press_maybe(can_save.then_some(Message::SaveLocation))
                        .style(style::button_primary),
                    button(text("Cancel"))
                        .on_press(Message::CancelLocation)
                        .style(style::button_secondary),
                ]
                .spacing(8),
            ]
            .spacing(10),
        )
        .padding(12)
        .width(POPUP_WIDTH)
        .style(style::container_popup);

        Some(anchored(input.anchor, panel.into()))
    }

    fn view_location_list(&self) -> Element<'_, Message> {
        let entries = self
            .controller
            .list_view()
            .iter()
            .fold(Column::new().spacing(8), |col, entry| {
                col.push(
                    container(text(entry.as_str()).size(12))
                        .padding(8)
                        .width(Length::Fill)
                        .style(style::container_list_entry),
                )
            });

        container(
            column![
                text("Saved Locations").size(18),
                scrollable(entries).height(Length::Fill),
                text(self.status.as_str())
                    .size(12)
                    .color(style::palette::TEXT_SECONDARY),
            ]
            .spacing(12),
        )
        .padding(12)
        .width(SIDEBAR_WIDTH)
        .height(Length::Fill)
        .style(style::container_sidebar)
        .into()
    }
}

/// Places a popup with its top-left corner at `anchor` on the map.
fn anchored(anchor: Pixel, panel: Element<'_, Message>) -> Element<'_, Message> {
    column![
        Space::with_height(anchor.y.max(0.0) as f32),
        row![Space::with_width(anchor.x.max(0.0) as f32), panel],
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopin_core::geocode::parse_response;

    struct Canned;

    impl ReverseGeocoder for Canned {
        fn lookup(&self, coordinate: Coordinate) -> Option<LocationInfo> {
            parse_response(coordinate.rounded(), r#"{"address":{"city":"Bandung"}}"#).ok()
        }
    }

    fn app() -> App {
        App::new(Settings::default(), Arc::new(Canned)).0
    }

    fn click(app: &mut App, pixel: Pixel) -> LookupTicket {
        let viewport = *app.controller.viewport();
        let ticket = app.start_lookup(pixel, viewport).unwrap();
        assert_eq!(app.controller.pending(), Some(ticket.coordinate));
        ticket
    }

    #[test]
    fn test_messages_drive_a_save() {
        let mut app = app();
        let ticket = click(&mut app, Pixel::new(300.0, 200.0));
        let info = Canned.lookup(ticket.coordinate);

        let _ = app.update(Message::LookupFinished(ticket, info));
        assert!(app.controller.input_popup().is_visible());
        assert!(app.view_input_popup().is_some());

        let _ = app.update(Message::DescriptionChanged("Home".into()));
        let _ = app.update(Message::SaveLocation);
        assert_eq!(app.controller.store().len(), 1);
        assert_eq!(app.status, "1 saved locations");
        assert!(app.view_input_popup().is_none());
    }

    #[test]
    fn test_failed_lookup_opens_error_popup() {
        let mut app = app();
        let ticket = click(&mut app, Pixel::new(300.0, 200.0));

        let _ = app.update(Message::LookupFinished(ticket, None));
        assert_eq!(app.status, "Lookup failed");
        assert!(app.view_info_popup().is_some());

        let _ = app.update(Message::CloseInfo);
        assert!(app.view_info_popup().is_none());
    }

    #[test]
    fn test_result_for_superseded_click_is_ignored() {
        let mut app = app();
        let first = click(&mut app, Pixel::new(300.0, 200.0));
        let second = click(&mut app, Pixel::new(500.0, 400.0));

        let _ = app.update(Message::LookupFinished(first, Canned.lookup(first.coordinate)));
        assert!(app.view_input_popup().is_none());
        assert_eq!(app.status, format!("Looking up {}...", second.coordinate.rounded()));

        let _ = app.update(Message::LookupFinished(second, Canned.lookup(second.coordinate)));
        assert!(app.view_input_popup().is_some());
    }
}
