//! Built-in reference client — the walking-character demo.
//!
//! Speaks the client side of the protocol on its own stdin/stdout, so
//! `ascii-arcade host ascii-arcade demo` is a complete session. Per frame it
//! moves a character with WASD (8-directional, normalized), tiles a grass
//! asset across the window, draws the character center-anchored, a red
//! circle at the mouse, and an FPS readout. The game logic is separated from
//! the stdio loop so it can be driven directly in tests.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::protocol::{decode_event_line, InputEvent, END_FRAME, END_INIT, END_INPUT};

const TITLE: &str = "Arcade Demo";
const GRASS: &str = "assets/grass.png";
const CHARACTER: &str = "assets/character_sprite.png";
/// Cells per second.
const SPEED: f32 = 20.0;
const CHARACTER_SIZE: (f32, f32) = (10.0, 5.0);
const CURSOR_RADIUS: f32 = 2.0;

pub struct Demo {
    pos: (f32, f32),
    mouse: (f32, f32),
    window: (f32, f32),
    keys: BTreeSet<String>,
    dt: f32,
}

impl Demo {
    pub fn new() -> Self {
        Demo {
            pos: (10.0, 6.0),
            mouse: (0.0, 0.0),
            window: (0.0, 0.0),
            keys: BTreeSet::new(),
            dt: 0.0,
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::MouseMoved(x, y) => self.mouse = (*x, *y),
            InputEvent::WindowResized(w, h) => self.window = (*w, *h),
            InputEvent::Dt(dt) => self.dt = *dt,
            InputEvent::Key { name, pressed } => {
                if *pressed {
                    self.keys.insert(name.clone());
                } else {
                    self.keys.remove(name);
                }
            }
            InputEvent::MouseButton { .. } => {}
        }
    }

    /// WASD direction, normalized so diagonals are no faster than axes.
    pub fn velocity(keys: &BTreeSet<String>) -> (f32, f32) {
        let held = |k: &str| f32::from(u8::from(keys.contains(k)));
        let (vx, vy) = (held("D") - held("A"), held("S") - held("W"));
        let mag = (vx * vx + vy * vy).sqrt();
        if mag > 0.0 {
            (vx / mag, vy / mag)
        } else {
            (0.0, 0.0)
        }
    }

    pub fn advance(&mut self) {
        let (vx, vy) = Self::velocity(&self.keys);
        self.pos.0 += vx * SPEED * self.dt;
        self.pos.1 += vy * SPEED * self.dt;
    }

    /// The frame's drawing commands, `end_frame` included. `grass` is the
    /// host's answer to this frame's texture-size query.
    pub fn render(&self, grass: (f32, f32)) -> Vec<String> {
        let mut lines = vec![
            "color white".to_owned(),
            "clear".to_owned(),
            "anchor left top".to_owned(),
        ];
        let cols = (self.window.0 / grass.0).ceil() as u32;
        let rows = (self.window.1 / grass.1).ceil() as u32;
        for i in 0..cols {
            for j in 0..rows {
                lines.push(format!(
                    "image {GRASS} {} {}",
                    i as f32 * grass.0,
                    j as f32 * grass.1
                ));
            }
        }
        lines.push("anchor center".to_owned());
        lines.push(format!(
            "image {CHARACTER} {} {} {} {}",
            self.pos.0, self.pos.1, CHARACTER_SIZE.0, CHARACTER_SIZE.1
        ));
        lines.push("color red".to_owned());
        lines.push(format!(
            "circle {} {} {CURSOR_RADIUS}",
            self.mouse.0, self.mouse.1
        ));
        lines.push("color black".to_owned());
        lines.push("anchor left top".to_owned());
        lines.push(format!("text 1 1 {} fps", (1.0 / self.dt) as i32));
        lines.push(END_FRAME.to_owned());
        lines
    }
}

impl Default for Demo {
    fn default() -> Self {
        Self::new()
    }
}

/// The stdio loop: init batch, then frames until the host closes the pipe.
pub fn run() -> Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    writeln!(writer, "title {TITLE}")?;
    writeln!(writer, "window_size 80 24")?;
    writeln!(writer, "vsync true")?;
    writeln!(writer, "{END_INIT}")?;
    writer.flush()?;

    let mut demo = Demo::new();
    let mut line = String::new();
    loop {
        // Input phase: consume events until the sentinel.
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(()); // host closed the channel
            }
            if line.trim() == END_INPUT {
                break;
            }
            match decode_event_line(&line) {
                Ok(Some(event)) => demo.handle_event(&event),
                Ok(None) => {}
                Err(e) => eprintln!("{e}"),
            }
        }
        demo.advance();

        // Drawing phase, starting with the texture-size round-trip.
        writeln!(writer, "get_texture_size {GRASS}")?;
        writer.flush()?;
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let grass = parse_size(&line)
            .with_context(|| format!("bad texture size reply {:?}", line.trim()))?;

        for out in demo.render(grass) {
            writeln!(writer, "{out}")?;
        }
        writer.flush()?;
    }
}

fn parse_size(line: &str) -> Option<(f32, f32)> {
    let mut parts = line.split_whitespace();
    let w = parts.next()?.parse().ok()?;
    let h = parts.next()?.parse().ok()?;
    Some((w, h))
}
