use crate::Message;
use geopin_core::geo::Pixel;
use geopin_core::surface::MARKER_ICON_SIZE;
use geopin_core::{MarkerFeature, Viewport};
use iced::advanced::{self, layout, renderer, widget, Layout, Widget};
use iced::widget::image;
use iced::{mouse, Border, Color, Element, Event, Length, Radians, Rectangle};
use log::{debug, warn};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const IMAGE_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(300) {
    Some(size) => size,
    None => panic!("image cache size must be non-zero"),
};
/// Release within this many pixels of the press counts as a click, not a drag.
const CLICK_SLOP: f32 = 5.0;

// --- Image Management ---
/// Background-fetched images (map tiles and the marker icon) keyed by URL.
pub struct ImageCache {
    images: Arc<Mutex<LruCache<String, image::Handle>>>,
    pending: Arc<Mutex<HashSet<String>>>,
    user_agent: String,
}

impl ImageCache {
    pub fn new(user_agent: String) -> Self {
        Self {
            images: Arc::new(Mutex::new(LruCache::new(IMAGE_CACHE_SIZE))),
            pending: Arc::new(Mutex::new(HashSet::new())),
            user_agent,
        }
    }

    pub fn get(&self, url: &str) -> Option<image::Handle> {
        let mut images = self.images.lock().ok()?;
        images.get(url).cloned()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().map(|p| !p.is_empty()).unwrap_or(false)
    }

    pub fn request(&self, url: &str) {
        {
            let Ok(mut pending) = self.pending.lock() else {
                return;
            };
            if pending.contains(url) {
                return;
            }
            if let Ok(images) = self.images.lock() {
                if images.contains(url) {
                    return;
                }
            }
            pending.insert(url.to_string());
        }

        let images = Arc::clone(&self.images);
        let pending = Arc::clone(&self.pending);
        let url = url.to_string();
        let user_agent = self.user_agent.clone();

        std::thread::spawn(move || {
            let resp = ureq::get(&url)
                .set("User-Agent", &user_agent)
                .timeout(Duration::from_secs(10))
                .call();

            match resp {
                Ok(response) => {
                    let mut bytes = Vec::new();
                    match std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes) {
                        Ok(_) => {
                            debug!("Fetched image — url={} bytes={}", url, bytes.len());
                            if let Ok(mut images) = images.lock() {
                                images.put(url.clone(), image::Handle::from_bytes(bytes));
                            }
                        }
                        Err(e) => warn!("Failed to read image — url={} error={}", url, e),
                    }
                }
                Err(e) => warn!("Failed to fetch image — url={} error={}", url, e),
            }
            if let Ok(mut pending) = pending.lock() {
                pending.remove(&url);
            }
        });
    }
}

pub struct MapView<'a> {
    pub viewport: Viewport,
    pub markers: &'a [MarkerFeature],
    pub images: &'a ImageCache,
    pub tile_url: &'a str,
    pub marker_icon_url: &'a str,
}

#[derive(Debug, Clone, Copy, Default)]
struct MapState {
    is_dragging: bool,
    press_position: Option<iced::Point>,
    last_cursor: Option<iced::Point>,
    // Track values between prop updates to handle multiple events per frame
    current: Option<Viewport>,
    last_prop: Option<Viewport>,
}

impl<'a> MapView<'a> {
    /// The viewport to draw with: internal state during interactions, props otherwise.
    fn effective_viewport(&self, state: &MapState, bounds: Rectangle) -> Viewport {
        let mut viewport = match (state.current, state.last_prop) {
            (Some(current), Some(prop))
                if prop.center == self.viewport.center && prop.zoom == self.viewport.zoom =>
            {
                current
            }
            _ => self.viewport,
        };
        viewport.resize(bounds.width as f64, bounds.height as f64);
        viewport
    }
}

impl<'a, Theme, Renderer> Widget<Message, Theme, Renderer> for MapView<'a>
where
    Renderer: renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn size(&self) -> iced::Size<Length> {
        iced::Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn tag(&self) -> widget::tree::Tag {
        widget::tree::Tag::of::<MapState>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::new(MapState::default())
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(limits.max())
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<MapState>();
        let bounds = layout.bounds();
        let view = self.effective_viewport(state, bounds);

        renderer.with_layer(bounds, |renderer| {
            renderer.fill_quad(
                renderer::Quad {
                    bounds,
                    border: Border::default(),
                    ..Default::default()
                },
                Color::from_rgb(0.05, 0.05, 0.05),
            );

            // --- Tile Layer ---
            for tile in view.visible_tiles() {
                let tile_rect = Rectangle {
                    x: bounds.x + tile.origin.x as f32,
                    y: bounds.y + tile.origin.y as f32,
                    width: tile.size as f32,
                    height: tile.size as f32,
                };
                let url = tile.coords.url(self.tile_url);

                if let Some(handle) = self.images.get(&url) {
                    renderer.draw_image(
                        advanced::image::Image {
                            handle,
                            filter_method: image::FilterMethod::Linear,
                            rotation: Radians(0.0),
                            opacity: 1.0,
                            snap: false,
                        },
                        tile_rect,
                    );
                } else {
                    renderer.fill_quad(
                        renderer::Quad {
                            bounds: tile_rect,
                            ..Default::default()
                        },
                        Color::from_rgb(0.1, 0.1, 0.1),
                    );
                    self.images.request(&url);
                }
            }
        });

        // --- Marker Layer ---
        // Insertion order, so later markers overlap earlier ones like hit-testing expects
        renderer.with_layer(bounds, |renderer| {
            let icon = self.images.get(self.marker_icon_url);
            if icon.is_none() {
                self.images.request(self.marker_icon_url);
            }
            let size = MARKER_ICON_SIZE as f32;

            for marker in self.markers {
                let tip = view.coordinate_to_pixel(marker.coordinate);
                let icon_rect = Rectangle {
                    x: bounds.x + tip.x as f32 - size / 2.0,
                    y: bounds.y + tip.y as f32 - size,
                    width: size,
                    height: size,
                };
                if !icon_rect.intersects(&bounds) {
                    continue;
                }

                match &icon {
                    Some(handle) => renderer.draw_image(
                        advanced::image::Image {
                            handle: handle.clone(),
                            filter_method: image::FilterMethod::Linear,
                            rotation: Radians(0.0),
                            opacity: 1.0,
                            snap: false,
                        },
                        icon_rect,
                    ),
                    // Round red pin until the icon arrives
                    None => renderer.fill_quad(
                        renderer::Quad {
                            bounds: Rectangle {
                                x: icon_rect.x + size / 4.0,
                                y: icon_rect.y,
                                width: size / 2.0,
                                height: size / 2.0,
                            },
                            border: Border {
                                color: Color::BLACK,
                                width: 1.0,
                                radius: (size / 4.0).into(),
                            },
                            ..Default::default()
                        },
                        Color::from_rgb(0.9, 0.15, 0.15),
                    ),
                }
            }
        });
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> advanced::graphics::core::event::Status {
        let state = tree.state.downcast_mut::<MapState>();
        let bounds = layout.bounds();

        // Initialize or sync internal state from props if props changed externally
        let props = (self.viewport.center, self.viewport.zoom);
        if state.last_prop.map(|p| (p.center, p.zoom)) != Some(props) {
            state.current = Some(self.viewport);
            state.last_prop = Some(self.viewport);
        }
        let mut view = self.effective_viewport(state, bounds);
        let cursor_pixel = cursor
            .position_in(bounds)
            .map(|p| Pixel::new(p.x as f64, p.y as f64));

        match event {
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if let Some(anchor) = cursor_pixel {
                    let d = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y as f64,
                        mouse::ScrollDelta::Pixels { y, .. } => (y as f64) / 100.0,
                    };
                    if view.zoom_at(anchor, d) {
                        // Update internal state immediately for next event in same frame
                        state.current = Some(view);
                        shell.publish(Message::MapMoved {
                            center: view.center,
                            zoom: view.zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if cursor.is_over(bounds) {
                    if let Some(position) = cursor.position() {
                        state.is_dragging = true;
                        state.press_position = Some(position);
                        state.last_cursor = Some(position);
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let was_dragging = state.is_dragging;
                let press_pos = state.press_position;
                let release_pos = cursor.position();

                state.is_dragging = false;
                state.press_position = None;
                state.last_cursor = None;

                if was_dragging {
                    if let (Some(p1), Some(p2), Some(pixel)) =
                        (press_pos, release_pos, cursor_pixel)
                    {
                        if (p1.x - p2.x).hypot(p1.y - p2.y) < CLICK_SLOP {
                            shell.publish(Message::MapClicked {
                                pixel,
                                viewport: view,
                            });
                        }
                    }
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last_pos) = state.last_cursor {
                        let delta = position - last_pos;
                        state.last_cursor = Some(position);
                        view.pan_by(delta.x as f64, delta.y as f64);

                        state.current = Some(view);
                        shell.publish(Message::MapMoved {
                            center: view.center,
                            zoom: view.zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            _ => {}
        }

        advanced::graphics::core::event::Status::Ignored
    }

    fn mouse_interaction(
        &self,
        tree: &widget::Tree,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        let state = tree.state.downcast_ref::<MapState>();
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Theme, Renderer> From<MapView<'a>> for Element<'a, Message, Theme, Renderer>
where
    Theme: 'a,
    Renderer: 'a + renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn from(map_view: MapView<'a>) -> Self {
        Self::new(map_view)
    }
}
