//! Protocol codec — the line-based wire format.
//!
//! Both halves of the per-frame exchange live here:
//! - Host → Client: `InputEvent` lines, batch-terminated by `end_input`
//! - Client → Host: `Command` lines, batch-terminated by `end_frame`
//!
//! Each line is whitespace-split into tokens; token 0 selects the variant and
//! the remaining tokens are positional arguments with a fixed, per-variant
//! arity. Unknown leading tokens decode to `None` (forward-compatible, never
//! an error); a malformed argument is a `FormatError` and skips only that
//! line. The codec knows nothing about phases or ordering — that is the
//! render state machine's job.

use std::fmt;

use crate::types::{Anchor, Color, FrameInput};

/// Terminates the client's one-time init batch.
pub const END_INIT: &str = "end_init";
/// Terminates the host's per-frame input batch.
pub const END_INPUT: &str = "end_input";
/// Terminates the client's per-frame drawing batch.
pub const END_FRAME: &str = "end_frame";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A recognized line with malformed arguments (wrong arity or a token that
/// failed coercion). Recoverable: the offending line is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub line: String,
    pub detail: String,
}

impl FormatError {
    fn new(line: &str, detail: impl Into<String>) -> Self {
        FormatError {
            line: line.to_owned(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed line {:?}: {}", self.line, self.detail)
    }
}

impl std::error::Error for FormatError {}

// ---------------------------------------------------------------------------
// Client → Host commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTitle(String),
    SetWindowSize(f32, f32),
    SetVsync(bool),
    EndInit,
    SetColor(Color),
    Clear,
    SetAnchor(Anchor),
    DrawImage {
        path: String,
        x: f32,
        y: f32,
        size: Option<(f32, f32)>,
    },
    DrawRectangle {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    DrawCircle {
        x: f32,
        y: f32,
        radius: f32,
    },
    DrawText {
        x: f32,
        y: f32,
        text: String,
    },
    QueryTextureSize(String),
    EndFrame,
}

impl Command {
    /// True for the commands only legal inside an open frame batch.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            Command::SetColor(_)
                | Command::Clear
                | Command::SetAnchor(_)
                | Command::DrawImage { .. }
                | Command::DrawRectangle { .. }
                | Command::DrawCircle { .. }
                | Command::DrawText { .. }
        )
    }
}

/// Decode one client line.
///
/// Returns `Ok(None)` for blank lines and unknown leading tokens (ignored,
/// so newer clients can speak to older hosts), `Err` for a recognized token
/// with bad arguments.
pub fn decode_command_line(line: &str) -> Result<Option<Command>, FormatError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let (head, rest) = split_token(trimmed);
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match (head, args.as_slice()) {
        ("title", _) => Command::SetTitle(rest.trim_start().to_owned()),
        ("window_size", [w, h]) => {
            Command::SetWindowSize(parse_float(line, w)?, parse_float(line, h)?)
        }
        ("window_size", _) => return Err(FormatError::new(line, "expected <w> <h>")),
        ("vsync", [on]) => Command::SetVsync(parse_bool(line, on)?),
        ("vsync", _) => return Err(FormatError::new(line, "expected <true|false>")),
        ("end_init", _) => Command::EndInit,
        ("color", [name]) => match Color::from_name(name) {
            Some(color) => Command::SetColor(color),
            None => return Err(FormatError::new(line, format!("unknown color {name:?}"))),
        },
        ("color", [r, g, b]) => {
            // Numeric channels are 0..=1 floats, scaled to u8.
            let [r, g, b] = [
                parse_float(line, r)?,
                parse_float(line, g)?,
                parse_float(line, b)?,
            ]
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            Command::SetColor(Color::Rgb { r, g, b })
        }
        ("color", _) => return Err(FormatError::new(line, "expected <name> or <r> <g> <b>")),
        ("clear", _) => Command::Clear,
        ("anchor", ["left", "top"]) => Command::SetAnchor(Anchor::TopLeft),
        ("anchor", ["center"]) => Command::SetAnchor(Anchor::Center),
        ("anchor", _) => {
            return Err(FormatError::new(line, "expected <left top> or <center>"));
        }
        ("image", [path, x, y]) => Command::DrawImage {
            path: (*path).to_owned(),
            x: parse_float(line, x)?,
            y: parse_float(line, y)?,
            size: None,
        },
        ("image", [path, x, y, w, h]) => Command::DrawImage {
            path: (*path).to_owned(),
            x: parse_float(line, x)?,
            y: parse_float(line, y)?,
            size: Some((parse_float(line, w)?, parse_float(line, h)?)),
        },
        ("image", _) => {
            return Err(FormatError::new(line, "expected <path> <x> <y> [<w> <h>]"));
        }
        ("rectangle", [x, y, w, h]) => Command::DrawRectangle {
            x: parse_float(line, x)?,
            y: parse_float(line, y)?,
            w: parse_float(line, w)?,
            h: parse_float(line, h)?,
        },
        ("rectangle", _) => return Err(FormatError::new(line, "expected <x> <y> <w> <h>")),
        ("circle", [x, y, radius]) => Command::DrawCircle {
            x: parse_float(line, x)?,
            y: parse_float(line, y)?,
            radius: parse_float(line, radius)?,
        },
        ("circle", _) => return Err(FormatError::new(line, "expected <x> <y> <radius>")),
        ("text", [x, y, ..]) => {
            // The text payload is the raw remainder of the line so interior
            // spacing survives tokenization.
            let (x_tok, after_x) = split_token(rest.trim_start());
            let (_, after_y) = split_token(after_x.trim_start());
            debug_assert_eq!(x_tok, *x);
            Command::DrawText {
                x: parse_float(line, x)?,
                y: parse_float(line, y)?,
                text: after_y.trim_start().to_owned(),
            }
        }
        ("text", _) => return Err(FormatError::new(line, "expected <x> <y> <string...>")),
        ("get_texture_size", [path]) => Command::QueryTextureSize((*path).to_owned()),
        ("get_texture_size", _) => return Err(FormatError::new(line, "expected <path>")),
        ("end_frame", _) => Command::EndFrame,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

// ---------------------------------------------------------------------------
// Host → Client events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMoved(f32, f32),
    WindowResized(f32, f32),
    Dt(f32),
    Key { name: String, pressed: bool },
    MouseButton { name: String, pressed: bool },
}

impl InputEvent {
    pub fn encode(&self) -> String {
        match self {
            InputEvent::MouseMoved(x, y) => format!("mouse_moved {x} {y}"),
            InputEvent::WindowResized(w, h) => format!("window_resized {w} {h}"),
            InputEvent::Dt(dt) => format!("dt {dt}"),
            InputEvent::Key { name, pressed } => format!("key {name} {pressed}"),
            InputEvent::MouseButton { name, pressed } => {
                format!("mouse_button {name} {pressed}")
            }
        }
    }
}

/// Decode one host event line. Mirror of `InputEvent::encode`; unknown
/// leading tokens are ignored, same as the command direction.
pub fn decode_event_line(line: &str) -> Result<Option<InputEvent>, FormatError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let (head, rest) = split_token(trimmed);
    let args: Vec<&str> = rest.split_whitespace().collect();

    let event = match (head, args.as_slice()) {
        ("mouse_moved", [x, y]) => {
            InputEvent::MouseMoved(parse_float(line, x)?, parse_float(line, y)?)
        }
        ("mouse_moved", _) => return Err(FormatError::new(line, "expected <x> <y>")),
        ("window_resized", [w, h]) => {
            InputEvent::WindowResized(parse_float(line, w)?, parse_float(line, h)?)
        }
        ("window_resized", _) => return Err(FormatError::new(line, "expected <w> <h>")),
        ("dt", [dt]) => InputEvent::Dt(parse_float(line, dt)?),
        ("dt", _) => return Err(FormatError::new(line, "expected <seconds>")),
        ("key", [name, pressed]) => InputEvent::Key {
            name: (*name).to_owned(),
            pressed: parse_bool(line, pressed)?,
        },
        ("key", _) => return Err(FormatError::new(line, "expected <name> <true|false>")),
        ("mouse_button", [name, pressed]) => InputEvent::MouseButton {
            name: (*name).to_owned(),
            pressed: parse_bool(line, pressed)?,
        },
        ("mouse_button", _) => {
            return Err(FormatError::new(line, "expected <name> <true|false>"));
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Encode a frame's input snapshot as protocol lines, terminated by
/// `end_input`. Fixed event order: movement, resize, key edges, button
/// edges, dt, sentinel. dt comes last so clients can treat it as
/// end-of-events.
pub fn encode_input(input: &FrameInput) -> Vec<String> {
    let mut lines = Vec::new();
    if input.mouse_moved {
        lines.push(InputEvent::MouseMoved(input.mouse.0, input.mouse.1).encode());
    }
    if input.window_resized {
        lines.push(InputEvent::WindowResized(input.window.0, input.window.1).encode());
    }
    for (name, pressed) in &input.key_events {
        lines.push(
            InputEvent::Key {
                name: name.clone(),
                pressed: *pressed,
            }
            .encode(),
        );
    }
    for (name, pressed) in &input.button_events {
        lines.push(
            InputEvent::MouseButton {
                name: name.clone(),
                pressed: *pressed,
            }
            .encode(),
        );
    }
    lines.push(InputEvent::Dt(input.dt).encode());
    lines.push(END_INPUT.to_owned());
    lines
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

/// Split off the first whitespace-delimited token; the remainder keeps its
/// leading separator so callers can preserve raw payloads.
fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

fn parse_float(line: &str, token: &str) -> Result<f32, FormatError> {
    token
        .parse::<f32>()
        .map_err(|_| FormatError::new(line, format!("expected a number, got {token:?}")))
}

fn parse_bool(line: &str, token: &str) -> Result<bool, FormatError> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FormatError::new(
            line,
            format!("expected true or false, got {token:?}"),
        )),
    }
}
