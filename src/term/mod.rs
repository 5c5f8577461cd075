/*!
## Terminal host

Runs one of the built-in demo programs on a [`Screen`](crate::gfx::Screen),
answering INPUT from the line editor and rendering the graphics buffer with
half-block characters when the program ends. Set `BASIC_LOG` to a tracing
filter such as `basic=debug` to see the runtime's log on stderr.

*/

use crate::gfx::{Screen, Span};
use crate::mach::{Event, Program, Runtime, Wait, DEFAULT_CYCLES};
use ansi_term::{Colour, Style};
use linefeed::{Interface, ReadResult, Terminal};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod demo;

pub use demo::{demo, DEMOS};

pub fn main() {
    install_tracing();
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(%error, "no ctrl-c handler");
    }
    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "hello".to_string());
    let program = match demo(&name) {
        Some(Ok(program)) => program,
        Some(Err(errors)) => {
            for error in errors {
                eprintln!("?{}", error);
            }
            return;
        }
        None => {
            eprintln!("usage: basic [{}] [list]", DEMOS.join("|"));
            return;
        }
    };
    if args.next().as_deref() == Some("list") {
        print!("{}", program);
        return;
    }
    if let Err(error) = main_loop(program, interrupted) {
        eprintln!("{}", error);
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_env("BASIC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main_loop(program: Program, interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let interface = Interface::new("BASIC")?;
    let mut runtime = Runtime::new(program, Screen::new());
    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            runtime.destroy();
        }
        let event = runtime.execute(DEFAULT_CYCLES);
        let waiting = matches!(event, Event::Waiting(Wait::Line) | Event::Waiting(Wait::Keys(_)));
        let prompt = flush(&interface, runtime.device_mut(), waiting)?;
        match event {
            Event::Yield => {}
            Event::Waiting(Wait::Line) | Event::Waiting(Wait::Keys(_)) => {
                interface.set_prompt(&prompt)?;
                match interface.read_line()? {
                    ReadResult::Input(string) => {
                        runtime.enter(&string);
                        interface.add_history_unique(string);
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => runtime.destroy(),
                }
            }
            Event::Waiting(Wait::Sleep(Some(seconds))) => {
                std::thread::sleep(Duration::from_secs_f64(seconds.clamp(0.0, 3600.0)));
                runtime.wake();
            }
            Event::Waiting(Wait::Sleep(None)) => {
                interface.set_prompt("")?;
                interface.read_line()?;
                runtime.wake();
            }
            Event::Stopped => break,
            Event::Fault(error) => {
                interface.write_fmt(format_args!(
                    "{}\n",
                    Style::new().bold().paint(error.to_string())
                ))?;
                break;
            }
        }
    }
    snapshot(&interface, runtime.device())
}

/// Write printed text. With `hold_prompt` the text after the last newline
/// is returned instead so the line editor can show it as the prompt.
fn flush<T: Terminal>(
    interface: &Interface<T>,
    screen: &mut Screen,
    hold_prompt: bool,
) -> std::io::Result<String> {
    let mut spans = screen.take_output();
    let mut prompt = String::new();
    if hold_prompt {
        while let Some(span) = spans.last_mut() {
            match span.text.rfind('\n') {
                Some(pos) => {
                    prompt.insert_str(0, &span.text[pos + 1..]);
                    span.text.truncate(pos + 1);
                    break;
                }
                None => {
                    prompt.insert_str(0, &span.text);
                    spans.pop();
                }
            }
        }
    }
    for span in &spans {
        interface.write_fmt(format_args!("{}", style(screen, span).paint(span.text.as_str())))?;
    }
    Ok(prompt)
}

fn colour(screen: &Screen, attribute: u8) -> Colour {
    let (r, g, b) = screen.palette().get(attribute);
    Colour::RGB(r, g, b)
}

fn style(screen: &Screen, span: &Span) -> Style {
    let style = Style::new().fg(colour(screen, span.foreground));
    if span.background == 0 {
        style
    } else {
        style.on(colour(screen, span.background))
    }
}

/// Downsample the graphics buffer to 80 columns of half blocks.
fn snapshot<T: Terminal>(interface: &Interface<T>, screen: &Screen) -> std::io::Result<()> {
    if !screen.mode().graphics {
        return Ok(());
    }
    let buffer = screen.buffer();
    let step = (buffer.width() / 80).max(1);
    let mut out = Vec::new();
    for y in (0..buffer.height()).step_by(step * 2) {
        for x in (0..buffer.width()).step_by(step) {
            let at = |y: usize| buffer.pixels()[y * buffer.width() + x];
            let upper = colour(screen, at(y));
            let lower = colour(screen, at((y + step).min(buffer.height() - 1)));
            write!(out, "{}", Style::new().fg(upper).on(lower).paint("\u{2580}"))?;
        }
        writeln!(out)?;
    }
    interface.write_fmt(format_args!("{}", String::from_utf8_lossy(&out)))
}
