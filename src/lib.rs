//! ascii-arcade — a terminal host for line-protocol game clients.
//!
//! Clients written in any language speak a newline-delimited text protocol
//! on their stdin/stdout: the host pushes one batch of input events per
//! frame (`end_input`-terminated) and the client answers with a batch of
//! drawing commands (`end_frame`-terminated), which the host applies to a
//! cell-grid canvas and presents in the terminal.
//!
//! Pipeline per frame: clock → input snapshot → protocol codec →
//! render state machine → canvas → screen.

pub mod assets;
pub mod canvas;
pub mod clock;
pub mod demo;
pub mod host;
pub mod input;
pub mod protocol;
pub mod render;
pub mod screen;
pub mod types;
