//! keyterm - demo host for raw terminal sessions and key combos
//!
//! Takes over the terminal, shows the key combo being typed, and runs the
//! bound commands. Bindings come from `~/.keyterm/config.toml` or the
//! built-in table below.
//!
//! # Default keybindings
//!
//! | Keys | Action |
//! |------|--------|
//! | ^q | Quit |
//! | ^l | Redraw |
//! | h/j/k/l | Move cursor |
//! | gg / G | Top / bottom row |
//! | ^t | Toggle cursor |
//! | Enter, ^^, // | Show a message |

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use keyterm::config::{BindingConfig, Config};
use keyterm::input::{Arg, Binding, KeyMatcher, KeyResult, PatternError};
use keyterm::{format_line, Backend, Session, SessionError};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line options
#[derive(Debug, Default)]
struct Options {
    /// Explicit config file
    config_path: Option<PathBuf>,
    /// Print the effective config and exit
    print_config: bool,
}

fn print_help() {
    eprintln!("keyterm {} - raw terminal key combo demo", VERSION);
    eprintln!();
    eprintln!("Usage: keyterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Load configuration from PATH");
    eprintln!("      --print-config    Print the effective configuration and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Default keybindings:");
    eprintln!("  ^q                    Quit");
    eprintln!("  ^l                    Redraw");
    eprintln!("  h j k l               Move cursor");
    eprintln!("  gg, G                 Jump to top / bottom row");
    eprintln!("  ^t                    Toggle cursor");
    eprintln!("  Enter, ^^, //         Show a message");
    eprintln!();
    eprintln!("Configuration: ~/.keyterm/config.toml");
    eprintln!("Log file: ~/.keyterm/keyterm.log (level from KEYTERM_LOG)");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                eprintln!("keyterm {}", VERSION);
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "--print-config" => {
                options.print_config = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Demo commands a binding can trigger
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Quit,
    Redraw,
    Move { dx: i32, dy: i32 },
    Top,
    Bottom,
    ToggleCursor,
    Say(String),
}

impl Command {
    /// Resolve a `[[bindings]]` action name and argument
    fn from_config(action: &str, arg: &Arg) -> anyhow::Result<Self> {
        let steps = || -> anyhow::Result<i32> {
            let n = arg.as_int().unwrap_or(1);
            i32::try_from(n)
                .ok()
                .filter(|n| *n != i32::MIN)
                .with_context(|| format!("step count {} for '{}' is out of range", n, action))
        };
        Ok(match action {
            "quit" => Command::Quit,
            "redraw" => Command::Redraw,
            "left" => Command::Move { dx: -steps()?, dy: 0 },
            "right" => Command::Move { dx: steps()?, dy: 0 },
            "up" => Command::Move { dx: 0, dy: -steps()? },
            "down" => Command::Move { dx: 0, dy: steps()? },
            "top" => Command::Top,
            "bottom" => Command::Bottom,
            "toggle-cursor" => Command::ToggleCursor,
            "say" => Command::Say(arg.as_str().unwrap_or_default().to_string()),
            other => bail!("unknown action '{}'", other),
        })
    }
}

fn default_bindings() -> Result<Vec<Binding<Command>>, PatternError> {
    let say = |msg: &str| Command::Say(msg.to_string());
    Ok(vec![
        Binding::parse("^q", Command::Quit)?,
        Binding::parse("^l", Command::Redraw)?,
        Binding::parse("^t", Command::ToggleCursor)?,
        Binding::parse("h", Command::Move { dx: -1, dy: 0 })?,
        Binding::parse("j", Command::Move { dx: 0, dy: 1 })?,
        Binding::parse("k", Command::Move { dx: 0, dy: -1 })?,
        Binding::parse("l", Command::Move { dx: 1, dy: 0 })?,
        Binding::parse("gg", Command::Top)?,
        Binding::parse("G", Command::Bottom)?,
        Binding::parse("/r", say("enter"))?,
        Binding::parse("^^", say("caret"))?,
        Binding::parse("//", say("slash"))?,
    ])
}

fn bindings_from_config(entries: &[BindingConfig]) -> anyhow::Result<Vec<Binding<Command>>> {
    entries
        .iter()
        .map(|entry| {
            let command = Command::from_config(&entry.action, &entry.arg)
                .with_context(|| format!("binding '{}'", entry.keys))?;
            Ok(Binding::new(entry.keys.clone(), command))
        })
        .collect()
}

/// Printable form of a raw combo
fn describe_combo(combo: &[u8]) -> String {
    combo
        .iter()
        .map(|&b| match b {
            0x08 => "/b".to_string(),
            0x0d => "/r".to_string(),
            0x7f => "^?".to_string(),
            b if b.is_ascii_control() => format!("^{}", (b | 0x40) as char),
            b => (b as char).to_string(),
        })
        .collect()
}

/// Demo application state
struct App<B: Backend> {
    session: Session<B>,
    matcher: KeyMatcher,
    bindings: Vec<Binding<Command>>,
    message: String,
    running: bool,
}

impl<B: Backend> App<B> {
    fn new(session: Session<B>, matcher: KeyMatcher, bindings: Vec<Binding<Command>>) -> Self {
        Self {
            session,
            matcher,
            bindings,
            message: String::from("ready"),
            running: true,
        }
    }

    fn run(&mut self) -> Result<(), SessionError> {
        self.session.move_cursor(1, 2)?;
        self.draw()?;

        while self.running {
            let Some(byte) = self.session.read_key()? else {
                continue;
            };
            self.handle_byte(byte)?;
            self.draw()?;
        }
        Ok(())
    }

    fn handle_byte(&mut self, byte: u8) -> Result<(), SessionError> {
        let command = match self.matcher.handle_key(byte, &self.bindings) {
            KeyResult::Handled(command) => command.clone(),
            KeyResult::Pending => return Ok(()),
            KeyResult::Unrecognized => {
                self.message = format!("unbound key {}", describe_combo(&[byte]));
                return Ok(());
            }
        };
        debug!("Running {:?}", command);
        self.apply(command)
    }

    fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        let (x, y) = self.session.cursor();
        let (width, height) = self.session.size();
        match command {
            Command::Quit => self.running = false,
            Command::Redraw => {
                self.session.refresh_window_size()?;
                self.session.clear_screen()?;
                self.message = String::from("redrawn");
            }
            Command::Move { dx, dy } => {
                let nx = (x as i32 + dx).clamp(1, width as i32) as u16;
                let ny = (y as i32 + dy).clamp(2, height.saturating_sub(1).max(2) as i32) as u16;
                self.session.move_cursor(nx, ny)?;
            }
            Command::Top => self.session.move_cursor(x, 2)?,
            Command::Bottom => self.session.move_cursor(x, height.saturating_sub(1).max(2))?,
            Command::ToggleCursor => {
                let visible = !self.session.cursor_visible();
                self.session.set_cursor_visible(visible)?;
            }
            Command::Say(msg) => self.message = msg,
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<(), SessionError> {
        let (width, height) = self.session.size();
        let (x, y) = self.session.cursor();
        let width = width as usize;

        let title = format!("keyterm {}  ^q quit", VERSION);
        self.session.draw_text(1, 1, format_line(1, width, title))?;

        let status = format!(
            "combo: {:<6} cursor: {},{}  {}",
            describe_combo(self.matcher.pending()),
            x,
            y,
            self.message
        );
        self.session.draw_text(1, height, format_line(1, width, status))?;

        self.session.commit()
    }
}

fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("keyterm.log"))
        .unwrap_or_else(|| PathBuf::from("keyterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("KEYTERM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = match &options.config_path {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };

    if options.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging();
    info!("keyterm starting...");

    let bindings = if config.bindings.is_empty() {
        default_bindings()?
    } else {
        bindings_from_config(&config.bindings)?
    };
    info!("{} bindings loaded", bindings.len());

    #[cfg(not(unix))]
    {
        let _ = bindings;
        eprintln!("keyterm currently only supports unix terminals.");
        return Ok(());
    }

    #[cfg(unix)]
    {
        run_terminal(&config, bindings)?;
    }

    Ok(())
}

#[cfg(unix)]
fn run_terminal(config: &Config, bindings: Vec<Binding<Command>>) -> anyhow::Result<()> {
    use keyterm::fatal;
    use keyterm::TtyBackend;

    let session_config = config.session_config();
    let backend = TtyBackend::open(session_config.read_timeout)?;
    let session = match Session::init(backend, &session_config) {
        Ok(session) => session,
        Err(e) => fatal::die(format!("{:#}", anyhow::Error::from(e))),
    };

    let matcher = KeyMatcher::new(config.keys.max_combo);
    for binding in matcher.unreachable(&bindings) {
        warn!(
            "Binding '{}' is longer than max_combo {} and will never fire",
            binding.pattern,
            matcher.max_combo()
        );
    }

    let mut app = App::new(session, matcher, bindings);
    if let Err(e) = app.run() {
        if e.is_fatal() {
            app.session.die(format!("{:#}", anyhow::Error::from(e)));
        }
        warn!("Stopped on error: {}", e);
    }

    app.session.shutdown()?;
    info!("keyterm exiting");
    Ok(())
}
