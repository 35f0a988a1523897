//! Frame loop driver — orchestrates the turn-based session with one client.
//!
//! The session is strictly half-duplex: the host writes an input batch, then
//! blocks reading the client's drawing batch, applies it, and hands the
//! canvas back to the caller for presentation. The one exception is
//! `get_texture_size`, which reverses the line direction mid-batch: the host
//! answers it inline before parsing the rest of the batch.
//!
//! Recoverable protocol errors (malformed lines, wrong-phase commands) are
//! logged to stderr and skipped. A closed channel at any blocking read is
//! fatal: there is no recovery point inside an unterminated frame.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::assets::AssetStore;
use crate::canvas::Canvas;
use crate::protocol::{decode_command_line, encode_input, Command};
use crate::render::RenderState;
use crate::types::FrameInput;

/// What the client asked for during its init batch. The window size is a
/// hint only: the host reports the real canvas size via `window_resized`.
#[derive(Debug, Clone, PartialEq)]
pub struct InitConfig {
    pub title: String,
    pub window_size: Option<(f32, f32)>,
    pub vsync: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            title: "My Game".to_owned(),
            window_size: None,
            vsync: true,
        }
    }
}

/// Process-wide session state: one per client, from spawn to disconnect.
pub struct Session<R, W> {
    reader: R,
    writer: W,
    state: RenderState,
    assets: AssetStore,
    frame: u64,
    /// Texture-size answers already given this frame, so repeated queries
    /// for one path stay identical without a second store lookup.
    query_cache: HashMap<String, (u32, u32)>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(reader: R, writer: W, assets: AssetStore) -> Self {
        Session {
            reader,
            writer,
            state: RenderState::new(),
            assets,
            frame: 0,
            query_cache: HashMap::new(),
        }
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Consume the client's init batch, up to and including `end_init`.
    pub fn run_init(&mut self) -> Result<InitConfig> {
        let mut config = InitConfig::default();
        loop {
            let Some(line) = self.read_line()? else {
                bail!("client disconnected during init");
            };
            match decode_command_line(&line) {
                Err(e) => eprintln!("{e}"),
                Ok(None) => {}
                Ok(Some(Command::SetTitle(title))) => config.title = title,
                Ok(Some(Command::SetWindowSize(w, h))) => config.window_size = Some((w, h)),
                Ok(Some(Command::SetVsync(on))) => config.vsync = on,
                Ok(Some(Command::EndInit)) => break,
                Ok(Some(command)) => {
                    eprintln!("command {command:?} dropped: illegal during init");
                }
            }
        }
        Ok(config)
    }

    /// Drive one frame: push the input batch, then block for the drawing
    /// batch and apply it to `canvas` in issued order.
    pub fn run_frame(&mut self, input: &FrameInput, canvas: &mut Canvas) -> Result<()> {
        self.query_cache.clear();

        for line in encode_input(input) {
            writeln!(self.writer, "{line}").context("client closed the channel")?;
        }
        self.writer.flush().context("client closed the channel")?;
        self.state.open_batch();

        loop {
            let Some(line) = self.read_line()? else {
                bail!(
                    "client disconnected before end_frame (frame {})",
                    self.frame + 1
                );
            };
            match decode_command_line(&line) {
                Err(e) => eprintln!("{e}"),
                Ok(None) => {}
                Ok(Some(Command::QueryTextureSize(path))) => self.answer_query(&path)?,
                Ok(Some(command)) => {
                    let done = command == Command::EndFrame;
                    if let Err(e) = self.state.apply(&command, canvas, &mut self.assets) {
                        eprintln!("{e}");
                    }
                    if done {
                        break;
                    }
                }
            }
        }

        self.frame += 1;
        Ok(())
    }

    /// Mid-batch role reversal: reply `<w> <h>` before reading on.
    fn answer_query(&mut self, path: &str) -> Result<()> {
        let (w, h) = match self.query_cache.get(path) {
            Some(size) => *size,
            None => {
                let size = self.assets.texture_size(path);
                self.query_cache.insert(path.to_owned(), size);
                size
            }
        };
        writeln!(self.writer, "{w} {h}").context("client closed the channel")?;
        self.writer.flush().context("client closed the channel")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("read from client failed")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, NamedColor};
    use std::io::Cursor;

    const MANIFEST: &str = r#"{
        "assets": {
            "assets/grass.png": { "width": 8, "height": 4, "glyph": "░", "color": "green" }
        }
    }"#;

    fn session<'a>(script: &str, out: &'a mut Vec<u8>) -> Session<Cursor<String>, &'a mut Vec<u8>> {
        Session::new(
            Cursor::new(script.to_owned()),
            out,
            AssetStore::from_json(MANIFEST).unwrap(),
        )
    }

    fn basic_input() -> FrameInput {
        FrameInput {
            mouse: (5.0, 5.0),
            mouse_moved: true,
            dt: 0.5,
            ..FrameInput::default()
        }
    }

    #[test]
    fn init_batch_collects_config() {
        let mut out = Vec::new();
        let script = "title Blob Quest\nwindow_size 800 600\nvsync true\nend_init\n";
        let config = session(script, &mut out).run_init().unwrap();
        assert_eq!(
            config,
            InitConfig {
                title: "Blob Quest".to_owned(),
                window_size: Some((800.0, 600.0)),
                vsync: true,
            }
        );
    }

    #[test]
    fn init_ignores_garbage_and_drops_drawing_commands() {
        let mut out = Vec::new();
        let script = "hologram on\ncircle 1 1 1\nwindow_size not numbers\nend_init\n";
        let config = session(script, &mut out).run_init().unwrap();
        assert_eq!(config, InitConfig::default());
    }

    #[test]
    fn disconnect_during_init_is_fatal() {
        let mut out = Vec::new();
        let err = session("title Hi\n", &mut out).run_init().unwrap_err();
        assert!(err.to_string().contains("disconnected during init"));
    }

    #[test]
    fn one_frame_applies_commands_in_order() {
        let mut out = Vec::new();
        let script = "color white\nclear\ncolor red\nrectangle 0 0 2 2\ntext 0 3 hi\nend_frame\n";
        let mut sess = session(script, &mut out);
        let mut canvas = Canvas::new(8, 8);

        sess.run_frame(&basic_input(), &mut canvas).unwrap();
        assert_eq!(sess.frame(), 1);
        assert_eq!(canvas.cell(4, 4).unwrap().bg, Color::WHITE);
        assert_eq!(
            canvas.cell(1, 1).unwrap().bg,
            Color::Named(NamedColor::Red)
        );
        assert_eq!(canvas.cell(0, 3).unwrap().ch, 'h');

        let written = String::from_utf8(out).unwrap();
        assert_eq!(written, "mouse_moved 5 5\ndt 0.5\nend_input\n");
    }

    #[test]
    fn texture_queries_are_answered_inline_and_cached() {
        let mut out = Vec::new();
        let script = "get_texture_size assets/grass.png\n\
                      image assets/grass.png 0 0\n\
                      get_texture_size assets/grass.png\n\
                      end_frame\n";
        let mut sess = session(script, &mut out);
        let mut canvas = Canvas::new(16, 8);

        sess.run_frame(&basic_input(), &mut canvas).unwrap();
        let written = String::from_utf8(out).unwrap();
        let replies: Vec<&str> = written
            .lines()
            .filter(|l| !l.starts_with(|c: char| c.is_ascii_lowercase()))
            .collect();
        assert_eq!(replies, vec!["8 4", "8 4"]);
        assert_eq!(canvas.cell(0, 0).unwrap().ch, '░');
    }

    #[test]
    fn malformed_and_unknown_lines_skip_without_aborting_the_frame() {
        let mut out = Vec::new();
        let script = "circle ten 20 5\nsparkle 1 2 3\ncolor red\nclear\nend_frame\n";
        let mut sess = session(script, &mut out);
        let mut canvas = Canvas::new(4, 4);

        sess.run_frame(&basic_input(), &mut canvas).unwrap();
        assert_eq!(
            canvas.cell(0, 0).unwrap().bg,
            Color::Named(NamedColor::Red)
        );
    }

    #[test]
    fn missing_end_frame_sentinel_is_fatal() {
        let mut out = Vec::new();
        let script = "color red\nclear\n";
        let mut sess = session(script, &mut out);
        let mut canvas = Canvas::new(4, 4);

        let err = sess.run_frame(&basic_input(), &mut canvas).unwrap_err();
        assert!(err.to_string().contains("before end_frame"));
        assert_eq!(sess.frame(), 0);
    }

    #[test]
    fn two_frames_share_render_state() {
        let mut out = Vec::new();
        let script = "color red\nanchor center\nend_frame\nrectangle 2 2 2 2\nend_frame\n";
        let mut sess = session(script, &mut out);
        let mut canvas = Canvas::new(4, 4);

        sess.run_frame(&basic_input(), &mut canvas).unwrap();
        sess.run_frame(&basic_input(), &mut canvas).unwrap();
        assert_eq!(sess.frame(), 2);
        // Second frame's rectangle drew center-anchored in last frame's red.
        assert_eq!(
            canvas.cell(1, 1).unwrap().bg,
            Color::Named(NamedColor::Red)
        );
    }
}
