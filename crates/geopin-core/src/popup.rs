use crate::geo::Pixel;
use crate::geocode::LocationInfo;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InfoState {
    #[default]
    Hidden,
    Visible {
        title: String,
        message: String,
        anchor: Pixel,
    },
}

/// Read-only panel for marker details and error messages.
#[derive(Debug, Default)]
pub struct InfoPopup {
    state: InfoState,
}

impl InfoPopup {
    /// Replaces content and position, whether or not the panel is already open.
    pub fn show(&mut self, title: impl Into<String>, message: impl Into<String>, anchor: Pixel) {
        self.state = InfoState::Visible {
            title: title.into(),
            message: message.into(),
            anchor,
        };
    }

    pub fn hide(&mut self) {
        self.state = InfoState::Hidden;
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, InfoState::Visible { .. })
    }

    pub fn state(&self) -> &InfoState {
        &self.state
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputPanel {
    pub info: LocationInfo,
    pub anchor: Pixel,
}

/// What a successful confirm hands back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmed {
    pub description: String,
    pub address: String,
}

/// Editable panel: address block plus a description field with save and cancel.
#[derive(Debug, Default)]
pub struct InputPopup {
    panel: Option<InputPanel>,
    description: String,
}

impl InputPopup {
    pub fn show(&mut self, info: LocationInfo, anchor: Pixel) {
        self.panel = Some(InputPanel { info, anchor });
        self.description.clear();
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn panel(&self) -> Option<&InputPanel> {
        self.panel.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.panel.is_some()
    }

    /// Closes the panel and returns its contents, unless the trimmed description is empty.
    pub fn confirm(&mut self) -> Option<Confirmed> {
        let description = self.description.trim();
        if description.is_empty() {
            return None;
        }
        let panel = self.panel.take()?;
        let confirmed = Confirmed {
            description: description.to_string(),
            address: panel.info.summary(),
        };
        self.description.clear();
        Some(confirmed)
    }

    pub fn cancel(&mut self) {
        self.panel = None;
        self.description.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::geocode::{parse_response, LocationInfo};

    fn info() -> LocationInfo {
        parse_response(
            Coordinate::new(1.0, 2.0),
            r#"{"address": {"city": "Bandung"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_info_show_overwrites() {
        let mut popup = InfoPopup::default();
        assert!(!popup.is_visible());
        popup.show("A", "first", Pixel::new(1.0, 1.0));
        popup.show("B", "second", Pixel::new(5.0, 6.0));
        assert_eq!(
            popup.state(),
            &InfoState::Visible {
                title: "B".into(),
                message: "second".into(),
                anchor: Pixel::new(5.0, 6.0),
            }
        );
        popup.hide();
        assert!(!popup.is_visible());
    }

    #[test]
    fn test_confirm_refuses_blank_description() {
        let mut popup = InputPopup::default();
        popup.show(info(), Pixel::default());
        assert_eq!(popup.confirm(), None);
        popup.set_description("   \t");
        assert_eq!(popup.confirm(), None);
        assert!(popup.is_visible());
    }

    #[test]
    fn test_confirm_trims_and_closes() {
        let mut popup = InputPopup::default();
        popup.show(info(), Pixel::default());
        popup.set_description("  Home ");
        let confirmed = popup.confirm().unwrap();
        assert_eq!(confirmed.description, "Home");
        assert!(confirmed.address.contains("City: Bandung"));
        assert!(!popup.is_visible());
        assert_eq!(popup.description(), "");
    }

    #[test]
    fn test_confirm_while_hidden_is_noop() {
        let mut popup = InputPopup::default();
        popup.set_description("Home");
        assert_eq!(popup.confirm(), None);
        assert_eq!(popup.description(), "Home");
    }

    #[test]
    fn test_show_clears_previous_description() {
        let mut popup = InputPopup::default();
        popup.show(info(), Pixel::default());
        popup.set_description("draft");
        popup.show(info(), Pixel::new(3.0, 3.0));
        assert_eq!(popup.description(), "");
        assert_eq!(popup.panel().unwrap().anchor, Pixel::new(3.0, 3.0));
    }

    #[test]
    fn test_cancel_clears() {
        let mut popup = InputPopup::default();
        popup.show(info(), Pixel::default());
        popup.set_description("draft");
        popup.cancel();
        assert!(!popup.is_visible());
        assert_eq!(popup.description(), "");
    }
}
