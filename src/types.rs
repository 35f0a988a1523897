//! Shared boundary types for the arcade host.
//!
//! This module defines the data contracts crossed by the frame loop:
//! - OS input layer → Protocol Codec: `FrameInput` (one per frame)
//! - Render State Machine → Canvas: `Color`, `Anchor`, `Cell`

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared style primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const BLACK: Color = Color::Named(NamedColor::Black);
    pub const WHITE: Color = Color::Named(NamedColor::White);

    /// Parse a protocol color name. Returns `None` for unrecognized names.
    pub fn from_name(name: &str) -> Option<Color> {
        let named = match name {
            "black" => NamedColor::Black,
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "yellow" => NamedColor::Yellow,
            "blue" => NamedColor::Blue,
            "magenta" => NamedColor::Magenta,
            "cyan" => NamedColor::Cyan,
            "white" => NamedColor::White,
            _ => return None,
        };
        Some(Color::Named(named))
    }
}

/// How a position argument relates to a primitive's bounding box.
///
/// `TopLeft`: the position is the box's top-left corner.
/// `Center`: the position is the box's centroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Anchor {
    #[default]
    TopLeft,
    Center,
}

impl Anchor {
    /// Resolve a protocol position + box size into the box's top-left corner.
    pub fn place(self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32) {
        match self {
            Anchor::TopLeft => (x, y),
            Anchor::Center => (x - w / 2.0, y - h / 2.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            fg: Color::WHITE,
            bg: Color::BLACK,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-frame input snapshot
// ---------------------------------------------------------------------------

/// Everything the host tells the client about one frame.
///
/// Created fresh each iteration by the input tracker and never mutated after
/// encoding. `mouse_moved` / `window_resized` gate the corresponding lines so
/// unchanged state is not re-reported (the first frame always reports the
/// window size).
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub mouse: (f32, f32),
    pub mouse_moved: bool,
    pub window: (f32, f32),
    pub window_resized: bool,
    pub dt: f32,
    pub pressed_keys: BTreeSet<String>,
    /// Key edges since the last frame, in arrival order: (name, pressed).
    pub key_events: Vec<(String, bool)>,
    /// Mouse button edges since the last frame: (name, pressed).
    pub button_events: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_color_lookup() {
        assert_eq!(Color::from_name("white"), Some(Color::WHITE));
        assert_eq!(Color::from_name("chartreuse"), None);
    }

    #[test]
    fn anchor_placement() {
        assert_eq!(Anchor::TopLeft.place(10.0, 20.0, 4.0, 6.0), (10.0, 20.0));
        assert_eq!(Anchor::Center.place(10.0, 20.0, 4.0, 6.0), (8.0, 17.0));
    }

    #[test]
    fn color_deserializes_from_name_or_rgb() {
        let named: Color = serde_json::from_str("\"green\"").unwrap();
        assert_eq!(named, Color::Named(NamedColor::Green));
        let rgb: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(rgb, Color::Rgb { r: 1, g: 2, b: 3 });
    }
}
