//! Input snapshot — translates terminal events into protocol terms.
//!
//! The tracker owns the cross-frame input state: the pressed-key set, the
//! last reported mouse position and window size. Each frame it drains the
//! accumulated edges into a fresh `FrameInput`; unchanged position/size is
//! not re-reported (the first frame always reports the window size so the
//! client learns it).

use std::collections::BTreeSet;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::types::FrameInput;

/// What the host loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    /// Host-side quit chord (Ctrl+C). Consumed, never forwarded.
    Quit,
}

pub struct InputTracker {
    mouse: (f32, f32),
    mouse_moved: bool,
    window: (f32, f32),
    window_resized: bool,
    pressed: BTreeSet<String>,
    key_events: Vec<(String, bool)>,
    button_events: Vec<(String, bool)>,
}

impl InputTracker {
    pub fn new(window: (f32, f32)) -> Self {
        InputTracker {
            mouse: (0.0, 0.0),
            mouse_moved: false,
            window,
            window_resized: true,
            pressed: BTreeSet::new(),
            key_events: Vec::new(),
            button_events: Vec::new(),
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Action::Continue
            }
            Event::Resize(w, h) => {
                self.window = (f32::from(*w), f32::from(*h));
                self.window_resized = true;
                Action::Continue
            }
            _ => Action::Continue,
        }
    }

    /// Drain the frame's edges into an immutable snapshot.
    pub fn snapshot(&mut self, dt: f32) -> FrameInput {
        FrameInput {
            mouse: self.mouse,
            mouse_moved: std::mem::take(&mut self.mouse_moved),
            window: self.window,
            window_resized: std::mem::take(&mut self.window_resized),
            dt,
            pressed_keys: self.pressed.clone(),
            key_events: std::mem::take(&mut self.key_events),
            button_events: std::mem::take(&mut self.button_events),
        }
    }

    pub fn window(&self) -> (f32, f32) {
        self.window
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        let Some(name) = key_name(key.code) else {
            return Action::Continue;
        };
        match key.kind {
            KeyEventKind::Press => {
                // Legacy terminals report auto-repeat as more presses; only
                // the first edge is forwarded.
                if self.pressed.insert(name.clone()) {
                    self.key_events.push((name, true));
                }
            }
            KeyEventKind::Release => {
                if self.pressed.remove(&name) {
                    self.key_events.push((name, false));
                }
            }
            KeyEventKind::Repeat => {}
        }
        Action::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let pos = (f32::from(mouse.column), f32::from(mouse.row));
        if pos != self.mouse {
            self.mouse = pos;
            self.mouse_moved = true;
        }
        match mouse.kind {
            MouseEventKind::Down(button) => {
                self.button_events.push((button_name(button).to_owned(), true));
            }
            MouseEventKind::Up(button) => {
                self.button_events.push((button_name(button).to_owned(), false));
            }
            _ => {}
        }
    }
}

/// Protocol name for a key. Single characters are reported uppercase and
/// special keys by stable wire names (`Space`, `Enter`, `ArrowLeft`, ...)
/// that clients string-match against.
fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "Space".to_owned(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Enter => "Enter".to_owned(),
        KeyCode::Esc => "Escape".to_owned(),
        KeyCode::Tab => "Tab".to_owned(),
        KeyCode::Backspace => "Backspace".to_owned(),
        KeyCode::Delete => "Delete".to_owned(),
        KeyCode::Insert => "Insert".to_owned(),
        KeyCode::Home => "Home".to_owned(),
        KeyCode::End => "End".to_owned(),
        KeyCode::PageUp => "PageUp".to_owned(),
        KeyCode::PageDown => "PageDown".to_owned(),
        KeyCode::Left => "ArrowLeft".to_owned(),
        KeyCode::Right => "ArrowRight".to_owned(),
        KeyCode::Up => "ArrowUp".to_owned(),
        KeyCode::Down => "ArrowDown".to_owned(),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };
    Some(name)
}

fn button_name(button: crossterm::event::MouseButton) -> &'static str {
    use crossterm::event::MouseButton;
    match button {
        MouseButton::Left => "Primary",
        MouseButton::Right => "Secondary",
        MouseButton::Middle => "Middle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseButton};

    fn press(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn release(c: char) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn key_edges_maintain_pressed_set() {
        let mut tracker = InputTracker::new((80.0, 24.0));
        tracker.handle_event(&press('d'));
        tracker.handle_event(&press('d')); // auto-repeat
        tracker.handle_event(&press('w'));
        tracker.handle_event(&release('d'));

        let input = tracker.snapshot(0.016);
        assert_eq!(
            input.key_events,
            vec![
                ("D".to_owned(), true),
                ("W".to_owned(), true),
                ("D".to_owned(), false),
            ]
        );
        assert!(input.pressed_keys.contains("W"));
        assert!(!input.pressed_keys.contains("D"));

        // Edges are drained; the set persists.
        let next = tracker.snapshot(0.016);
        assert!(next.key_events.is_empty());
        assert!(next.pressed_keys.contains("W"));
    }

    #[test]
    fn first_snapshot_reports_window_size_once() {
        let mut tracker = InputTracker::new((80.0, 24.0));
        assert!(tracker.snapshot(0.1).window_resized);
        assert!(!tracker.snapshot(0.1).window_resized);
        tracker.handle_event(&Event::Resize(100, 40));
        let input = tracker.snapshot(0.1);
        assert!(input.window_resized);
        assert_eq!(input.window, (100.0, 40.0));
    }

    #[test]
    fn mouse_buttons_use_protocol_names() {
        let mut tracker = InputTracker::new((80.0, 24.0));
        tracker.handle_event(&Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 7,
            modifiers: KeyModifiers::NONE,
        }));
        let input = tracker.snapshot(0.1);
        assert_eq!(input.button_events, vec![("Primary".to_owned(), true)]);
        assert_eq!(input.mouse, (5.0, 7.0));
        assert!(input.mouse_moved);
    }

    #[test]
    fn ctrl_c_is_the_quit_chord() {
        let mut tracker = InputTracker::new((80.0, 24.0));
        let quit = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(tracker.handle_event(&quit), Action::Quit);
        assert!(tracker.snapshot(0.1).key_events.is_empty());
    }
}
