use std::io::BufReader;
use std::process::{self, Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::Event;

use ascii_arcade::{
    assets::AssetStore,
    canvas::Canvas,
    clock::FrameClock,
    demo,
    host::{InitConfig, Session},
    input::{Action, InputTracker},
    screen::TerminalScreen,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const HOST_USAGE: &str = "ascii-arcade host [--assets <manifest.json>] <command> [args...]";
const DEMO_USAGE: &str = "ascii-arcade demo";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("host") => {
            let mut manifest = None;
            let mut command = args.next().context(HOST_USAGE)?;
            if command == "--assets" {
                manifest = Some(args.next().context(HOST_USAGE)?);
                command = args.next().context(HOST_USAGE)?;
            }
            host(manifest.as_deref(), &command, args.collect())
        }
        Some("demo") => demo::run(),
        _ => bail!(
            "ASCII Arcade — terminal host for line-protocol game clients\n\nUsage:\n  {HOST_USAGE}\n  {DEMO_USAGE}"
        ),
    }
}

fn host(manifest: Option<&str>, command: &str, args: Vec<String>) -> Result<()> {
    let assets = match manifest {
        Some(path) => AssetStore::load(path)?,
        None => AssetStore::empty(),
    };

    let mut child = Command::new(command)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to start client {command:?}"))?;

    let result = drive_client(&mut child, assets);

    // The client has no shutdown message; closing it is the only signal.
    let _ = child.kill();
    let _ = child.wait();
    result
}

fn drive_client(child: &mut Child, assets: AssetStore) -> Result<()> {
    let writer = child.stdin.take().context("client stdin unavailable")?;
    let reader = BufReader::new(child.stdout.take().context("client stdout unavailable")?);
    let mut session = Session::new(reader, writer, assets);

    // Init happens before the terminal is taken over, so early protocol
    // failures print normally.
    let config = session.run_init()?;

    let mut screen = TerminalScreen::new(&config.title)?;
    let result = frame_loop(&mut session, &mut screen, &config);
    screen.restore();
    result
}

fn frame_loop<R, W>(
    session: &mut Session<R, W>,
    screen: &mut TerminalScreen,
    config: &InitConfig,
) -> Result<()>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    let (width, height) = screen.size()?;
    let mut canvas = Canvas::new(width, height);
    let mut tracker = InputTracker::new((f32::from(width), f32::from(height)));
    let mut clock = FrameClock::new();
    // No real swap chain in a terminal: the vsync hint picks the pacing
    // window we wait on for input.
    let pacing = if config.vsync {
        Duration::from_millis(16)
    } else {
        Duration::from_millis(1)
    };

    loop {
        for event in screen.drain_events(pacing)? {
            if tracker.handle_event(&event) == Action::Quit {
                return Ok(());
            }
            if let Event::Resize(w, h) = event {
                canvas.resize(w, h);
            }
        }
        let input = tracker.snapshot(clock.tick());
        session.run_frame(&input, &mut canvas)?;
        screen.present(&canvas)?;
    }
}
