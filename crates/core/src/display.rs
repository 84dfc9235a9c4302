//! The six-mode classifier output and its response envelope.

use serde::{Deserialize, Serialize};

/// One of the six ways the patient client can render a reply. Arity
/// (`media.len()`) is fixed per mode: 3/4/5 for the picture modes, 1 for
/// the video and agent modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    ThreePics,
    FourPics,
    FivePics,
    Video,
    VerticalVideo,
    Agent,
}

impl DisplayMode {
    /// Required `media.len()` for this mode.
    pub fn arity(&self) -> usize {
        match self {
            DisplayMode::ThreePics => 3,
            DisplayMode::FourPics => 4,
            DisplayMode::FivePics => 5,
            DisplayMode::Video => 1,
            DisplayMode::VerticalVideo => 1,
            DisplayMode::Agent => 1,
        }
    }

    /// Whether this mode is one of the picture family (used when the
    /// classifier needs to step down within the same family on an arity
    /// shortfall).
    pub fn is_picture_mode(&self) -> bool {
        matches!(
            self,
            DisplayMode::ThreePics | DisplayMode::FourPics | DisplayMode::FivePics
        )
    }

    /// The next picture mode down in arity, or `None` once at the floor.
    pub fn step_down(&self) -> Option<DisplayMode> {
        match self {
            DisplayMode::FivePics => Some(DisplayMode::FourPics),
            DisplayMode::FourPics => Some(DisplayMode::ThreePics),
            _ => None,
        }
    }

    /// Picture mode matching `min(image_count, 5)` clamped at a floor of 3;
    /// `None` when fewer than 3 images are available (caller should fall
    /// back to `video`).
    pub fn for_image_count(image_count: usize) -> Option<DisplayMode> {
        match image_count.min(5) {
            5 => Some(DisplayMode::FivePics),
            4 => Some(DisplayMode::FourPics),
            3 => Some(DisplayMode::ThreePics),
            _ => None,
        }
    }
}

/// The response of a patient query: a narrated (or agent-mode silent)
/// reply plus media consistent with `display_mode`'s arity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayPacket {
    pub topic: String,
    pub text: Option<String>,
    pub display_mode: DisplayMode,
    pub media: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matches_mode_table() {
        assert_eq!(DisplayMode::ThreePics.arity(), 3);
        assert_eq!(DisplayMode::FourPics.arity(), 4);
        assert_eq!(DisplayMode::FivePics.arity(), 5);
        assert_eq!(DisplayMode::Video.arity(), 1);
        assert_eq!(DisplayMode::VerticalVideo.arity(), 1);
        assert_eq!(DisplayMode::Agent.arity(), 1);
    }

    #[test]
    fn for_image_count_clamps_between_three_and_five() {
        assert_eq!(DisplayMode::for_image_count(9), Some(DisplayMode::FivePics));
        assert_eq!(DisplayMode::for_image_count(4), Some(DisplayMode::FourPics));
        assert_eq!(DisplayMode::for_image_count(3), Some(DisplayMode::ThreePics));
        assert_eq!(DisplayMode::for_image_count(2), None);
    }
}
