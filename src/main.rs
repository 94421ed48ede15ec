mod app;
mod audio;
mod config;
mod permission;
mod scheduler;
mod session;
mod types;
mod ui;
mod waveform;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::LevelFilter;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::app::App;
use crate::audio::device::{list_devices, Direction};
use crate::audio::writer::default_recording_name;
use crate::config::Config;
use crate::ui::{handle_input, render_ui, waveform_viewport};

const DEFAULT_CONFIG: &str = "waverec.yaml";

/// waverec - single-take audio recorder with a live waveform
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Terminal audio recorder with a live waveform",
    long_about = "Terminal audio recorder with a live waveform.\n\n\
                  Records the microphone to a WAV file while drawing its amplitude, \
                  then plays the take back while replaying the waveform.\n\n\
                  Configuration is loaded from waverec.yaml by default, or use --config \
                  to specify a different file."
)]
struct Args {
    /// List available audio devices
    #[arg(short, long)]
    list_devices: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    config: String,

    /// Increase logging verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// File that receives log output (the terminal belongs to the UI)
    #[arg(long, value_name = "PATH", default_value = "waverec.log")]
    log_file: PathBuf,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Send log output to the log file
fn init_logging(args: &Args) -> Result<()> {
    let file = File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file: {}", args.log_file.display()))?;

    let mut builder = env_logger::Builder::new();

    // Keep dependencies quiet
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("waverec", args.log_level());

    builder
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();

    Ok(())
}

/// Load configuration from file or use defaults
fn load_config(config_path: &str) -> Result<Config> {
    let path = Path::new(config_path);

    // If explicit config path provided and file doesn't exist, error
    if config_path != DEFAULT_CONFIG && !path.exists() {
        anyhow::bail!("Config file not found: {}", config_path);
    }

    // If default path and file doesn't exist, use defaults
    if config_path == DEFAULT_CONFIG && !path.exists() {
        return Ok(Config::default());
    }

    Config::from_file(path)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Handle --list-devices flag
    if args.list_devices {
        list_all_devices();
        return Ok(());
    }

    init_logging(&args)?;

    let config = load_config(&args.config)?;

    let output_path = match config.recording.file {
        Some(ref file) => file.clone(),
        None => env::current_dir()?.join(default_recording_name()),
    };
    log::info!("Recording to {}", output_path.display());

    let mut app = App::new(&config, output_path);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Release audio devices before handing the terminal back
    drop(app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("Exited with error: {:#}", e);
    }

    result
}

fn print_devices(title: &str, direction: Direction) {
    println!("{}:", title);
    match list_devices(direction) {
        Ok(devices) => {
            if devices.is_empty() {
                println!("  No devices found");
            } else {
                for (i, device) in devices.iter().enumerate() {
                    let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
                    println!(
                        "  [{}] {} - {}ch @ {}Hz{}",
                        i, device.name, device.channels, device.sample_rate, default_marker
                    );
                }
            }
        }
        Err(e) => {
            println!("  Error: {}", e);
        }
    }
    println!();
}

/// List all available audio devices
fn list_all_devices() {
    println!("waverec - available devices");
    println!("===========================");
    println!();

    print_devices("Audio Input Devices", Direction::Input);
    print_devices("Audio Output Devices", Direction::Output);

    println!("Configuration:");
    println!("  Create a waverec.yaml file to configure devices and the recording");
    println!("  Use --config <path> to specify a different config file");
    println!();
    println!("Example waverec.yaml:");
    println!("  devices:");
    println!("    input: \"USB Microphone\"");
    println!("    output: \"0\"");
    println!();
    println!("  recording:");
    println!("    file: \"take.wav\"");
    println!();
    println!("  waveform:");
    println!("    tick_ms: 50");
    println!("    bar_pitch: 13.0");
    println!("    bar_gap: 5.0");
}

/// Main application loop
fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Update message display (auto-clear expired messages)
        app.update_message();

        // Size the waveform surface for this frame before bars are laid out
        let size = terminal.size()?;
        app.viewport = waveform_viewport(Rect::new(0, 0, size.width, size.height), app.message.is_some());

        // Deliver ticks and playback completion
        app.update_session();

        // Render UI
        terminal.draw(|frame| render_ui(frame, app))?;

        // Handle input
        handle_input(app)?;

        // Check for quit
        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
