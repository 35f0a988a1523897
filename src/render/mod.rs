//! Render state machine — applies decoded commands to the canvas.
//!
//! Holds the persistent drawing state (current color, current anchor) and
//! the batch phase. Drawing commands are only legal inside an open batch;
//! the driver opens the batch when it writes `end_input`, the first drawing
//! command moves Idle → InFrame, and `end_frame` moves back to Idle. A
//! command in the wrong phase is a `SequenceError`: dropped and logged,
//! never fatal.
//!
//! `clear` fills the canvas with the current color and leaves color and
//! anchor untouched; both persist across frames until the client changes
//! them.

use std::fmt;

use crate::assets::AssetStore;
use crate::canvas::Canvas;
use crate::protocol::Command;
use crate::types::{Anchor, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InFrame,
}

/// A command issued in a phase where it is illegal. Recoverable: the
/// command is dropped and the batch continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceError {
    pub command: String,
    pub phase: Phase,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "command {:?} dropped: illegal in phase {:?}",
            self.command, self.phase
        )
    }
}

impl std::error::Error for SequenceError {}

pub struct RenderState {
    color: Color,
    anchor: Anchor,
    phase: Phase,
    batch_open: bool,
}

impl RenderState {
    pub fn new() -> Self {
        RenderState {
            color: Color::WHITE,
            anchor: Anchor::TopLeft,
            phase: Phase::Idle,
            batch_open: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Called by the driver after writing `end_input`: the client's drawing
    /// batch may now begin.
    pub fn open_batch(&mut self) {
        self.batch_open = true;
    }

    /// Apply one command in issued order.
    pub fn apply(
        &mut self,
        command: &Command,
        canvas: &mut Canvas,
        assets: &mut AssetStore,
    ) -> Result<(), SequenceError> {
        if command.is_drawing() {
            if !self.batch_open {
                return Err(self.reject(command));
            }
            self.phase = Phase::InFrame;
        }

        match command {
            Command::SetColor(color) => self.color = *color,
            Command::SetAnchor(anchor) => self.anchor = *anchor,
            Command::Clear => canvas.clear(self.color),
            Command::DrawRectangle { x, y, w, h } => {
                canvas.fill_rect(self.anchor, *x, *y, *w, *h, self.color);
            }
            Command::DrawCircle { x, y, radius } => {
                canvas.fill_circle(self.anchor, *x, *y, *radius, self.color);
            }
            Command::DrawText { x, y, text } => {
                canvas.draw_text(self.anchor, *x, *y, text, self.color);
            }
            Command::DrawImage { path, x, y, size } => {
                let asset = assets.resolve(path).clone();
                canvas.draw_image(self.anchor, *x, *y, &asset, *size);
            }
            Command::EndFrame => {
                self.phase = Phase::Idle;
                self.batch_open = false;
            }
            // Answered inline by the driver; no canvas effect.
            Command::QueryTextureSize(_) => {}
            // Init commands are only legal before the first frame, which the
            // driver handles itself.
            Command::SetTitle(_)
            | Command::SetWindowSize(_, _)
            | Command::SetVsync(_)
            | Command::EndInit => return Err(self.reject(command)),
        }
        Ok(())
    }

    fn reject(&self, command: &Command) -> SequenceError {
        SequenceError {
            command: format!("{command:?}"),
            phase: self.phase,
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_command_line;
    use crate::types::NamedColor;

    const RED: Color = Color::Named(NamedColor::Red);

    fn apply_line(
        state: &mut RenderState,
        canvas: &mut Canvas,
        assets: &mut AssetStore,
        line: &str,
    ) -> Result<(), SequenceError> {
        let command = decode_command_line(line).unwrap().unwrap();
        state.apply(&command, canvas, assets)
    }

    #[test]
    fn drawing_outside_a_batch_is_a_sequence_error() {
        let mut state = RenderState::new();
        let mut canvas = Canvas::new(4, 4);
        let mut assets = AssetStore::empty();

        let err = apply_line(&mut state, &mut canvas, &mut assets, "rectangle 0 0 4 4")
            .unwrap_err();
        assert_eq!(err.phase, Phase::Idle);
        assert_eq!(canvas.cell(0, 0).unwrap().bg, Color::BLACK);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn batch_ends_idle_and_closes() {
        let mut state = RenderState::new();
        let mut canvas = Canvas::new(4, 4);
        let mut assets = AssetStore::empty();

        state.open_batch();
        apply_line(&mut state, &mut canvas, &mut assets, "color red").unwrap();
        assert_eq!(state.phase(), Phase::InFrame);
        apply_line(&mut state, &mut canvas, &mut assets, "end_frame").unwrap();
        assert_eq!(state.phase(), Phase::Idle);

        // Anything drawn after end_frame and before the next end_input is
        // rejected and mutates nothing.
        let err =
            apply_line(&mut state, &mut canvas, &mut assets, "clear").unwrap_err();
        assert_eq!(err.phase, Phase::Idle);
        assert_eq!(canvas.cell(0, 0).unwrap().bg, Color::BLACK);
    }

    #[test]
    fn color_and_anchor_persist_across_clear_and_frames() {
        let mut state = RenderState::new();
        let mut canvas = Canvas::new(4, 4);
        let mut assets = AssetStore::empty();

        state.open_batch();
        apply_line(&mut state, &mut canvas, &mut assets, "color red").unwrap();
        apply_line(&mut state, &mut canvas, &mut assets, "anchor center").unwrap();
        apply_line(&mut state, &mut canvas, &mut assets, "clear").unwrap();
        assert_eq!(canvas.cell(0, 0).unwrap().bg, RED);
        assert_eq!(state.color(), RED);
        assert_eq!(state.anchor(), Anchor::Center);
        apply_line(&mut state, &mut canvas, &mut assets, "end_frame").unwrap();

        // The next frame draws with the previous frame's state.
        state.open_batch();
        apply_line(&mut state, &mut canvas, &mut assets, "rectangle 2 2 2 2").unwrap();
        assert_eq!(canvas.cell(1, 1).unwrap().bg, RED); // center-anchored
    }

    #[test]
    fn init_commands_are_illegal_mid_session() {
        let mut state = RenderState::new();
        let mut canvas = Canvas::new(4, 4);
        let mut assets = AssetStore::empty();

        state.open_batch();
        let err = apply_line(&mut state, &mut canvas, &mut assets, "vsync true")
            .unwrap_err();
        assert!(err.command.contains("SetVsync"));
    }

    #[test]
    fn draws_in_issued_order() {
        let mut state = RenderState::new();
        let mut canvas = Canvas::new(4, 4);
        let mut assets = AssetStore::empty();

        state.open_batch();
        apply_line(&mut state, &mut canvas, &mut assets, "color red").unwrap();
        apply_line(&mut state, &mut canvas, &mut assets, "rectangle 0 0 4 4").unwrap();
        apply_line(&mut state, &mut canvas, &mut assets, "color white").unwrap();
        apply_line(&mut state, &mut canvas, &mut assets, "rectangle 1 1 2 2").unwrap();
        assert_eq!(canvas.cell(0, 0).unwrap().bg, RED);
        assert_eq!(canvas.cell(1, 1).unwrap().bg, Color::WHITE);
    }
}
