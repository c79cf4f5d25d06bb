use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::info;

use sensorwatch::data::duration::parse_duration;
use sensorwatch::topics::DASHBOARD_TOPICS;
use sensorwatch::ui::{self, Theme};
use sensorwatch::{
    alarm, events, logging, AlertDispatcher, AlertQueue, App, FlashVibrator, MessageSource,
    MqttSource, Session, Settings, SoundHandle, StreamSource,
};

/// How long to wait for in-flight sound and pulse tasks at exit.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// UI tick; short enough for the 200ms pulse gap to be visible.
const TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "sensorwatch", version)]
#[command(about = "Terminal dashboard for ESP32 sensor readings and alerts over MQTT")]
struct Args {
    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Broker URL, e.g. mqtt://192.168.0.127:1883 (overrides the settings file)
    #[arg(short, long, global = true)]
    broker: Option<String>,

    /// Replay a recorded `<topic> <payload>` file instead of connecting
    #[arg(long, conflicts_with = "broker")]
    replay: Option<PathBuf>,

    /// Delay between replayed records (e.g., "500ms", "1s")
    #[arg(long, default_value = "500ms")]
    replay_interval: String,

    /// Log file (the dashboard owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate readings against thresholds and publish alerts
    Alarm,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(broker) = args.broker {
        settings.broker.url = broker;
    }
    if let Some(log_file) = args.log_file {
        settings.log.file = log_file;
    }

    match args.command {
        Some(Command::Alarm) => run_alarm(&settings),
        None => {
            let replay = match args.replay {
                Some(path) => {
                    let interval = parse_duration(&args.replay_interval).with_context(|| {
                        format!("Invalid --replay-interval {:?}", args.replay_interval)
                    })?;
                    Some((path, interval))
                }
                None => None,
            };
            run_dashboard(&settings, replay)
        }
    }
}

/// Headless threshold publisher.
fn run_alarm(settings: &Settings) -> Result<()> {
    logging::init_stderr(&settings.log.level)?;

    let options = settings.mqtt_options("sensorwatch-alarm")?;
    let thresholds = settings.thresholds()?;
    info!(?thresholds, "Starting alarm publisher");

    let rt = Runtime::new()?;
    rt.block_on(alarm::run(options, thresholds))
}

/// Run the dashboard against the broker, or a replay file when given.
fn run_dashboard(settings: &Settings, replay: Option<(PathBuf, Duration)>) -> Result<()> {
    logging::init_file(&settings.log.file, &settings.log.level)?;

    // The runtime drives the source and the notification tasks; the TUI
    // loop stays on the main thread.
    let rt = Runtime::new()?;

    let source: Box<dyn MessageSource> = match replay {
        Some((path, interval)) => open_replay(&rt, &path, interval)?,
        None => {
            let options = settings.mqtt_options("sensorwatch")?;
            Box::new(MqttSource::spawn(options, &DASHBOARD_TOPICS, rt.handle()))
        }
    };
    info!(source = source.description(), "Starting dashboard");

    let alerts = AlertQueue::new();
    let flash = FlashVibrator::new();
    let sound = SoundHandle::new(settings.sound_loader());
    info!(sound = %sound.describe(), "Alert sound");
    let dispatcher = AlertDispatcher::new(
        Box::new(alerts.clone()),
        sound,
        Arc::new(flash.clone()),
        rt.handle().clone(),
    );

    let theme = Theme::auto_detect();
    let mut app = App::new(source, Session::new(dispatcher), alerts, flash, theme);

    let result = run_tui(&mut app);

    app.shutdown();
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    info!("Dashboard closed");

    result
}

fn open_replay(rt: &Runtime, path: &Path, interval: Duration) -> Result<Box<dyn MessageSource>> {
    let file = rt
        .block_on(tokio::fs::File::open(path))
        .with_context(|| format!("Failed to open replay file {}", path.display()))?;
    let _guard = rt.enter();
    Ok(Box::new(StreamSource::spawn(file, &path.display().to_string(), interval)))
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.pump_messages();

        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5u16.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Charts
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);
            ui::charts::render(frame, app, chunks[2]);
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render alert overlay if one is pending
            ui::alert::render_overlay(frame, app, area);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(Event::Key(key)) = events::poll_event(TICK_RATE)? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
