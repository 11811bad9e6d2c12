use anyhow::Result;
use chatplug_core::{Config, PluginShell};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tao::dpi::LogicalSize;
use tao::event::{Event, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop};
use tao::window::WindowBuilder;
use tracing_subscriber::EnvFilter;

mod webview;

#[derive(Parser)]
#[command(name = "chatplug")]
#[command(about = "Desktop host for the chatplug plugin shell")]
struct Cli {
    /// Directory holding the UI bundle and the embedded entry script
    #[arg(short, long, default_value = "dist")]
    assets: PathBuf,

    /// Load the UI from the configured dev server instead of bundled assets
    #[arg(long)]
    dev: bool,

    /// Window width override
    #[arg(long)]
    width: Option<u32>,

    /// Window height override
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config, using defaults");
        Config::new()
    });

    let width = cli.width.unwrap_or(config.window_width);
    let height = cli.height.unwrap_or(config.window_height);
    let dev_server_url = if cli.dev {
        config.dev_server_url.clone()
    } else {
        None
    };

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("chatplug")
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)?;

    let mut shell = PluginShell::new(&config, &cli.assets)?;
    shell.initialize();

    let webview = webview::build_webview(
        &window,
        shell.request_queue(),
        &cli.assets,
        dev_server_url.as_deref(),
    )?;
    shell.attach_ui(Box::new(webview::WebviewSurface::new(webview)));

    // Everything runs on this one thread: UI events, the bridge pump, and
    // the blocking feed poll. A slow feed endpoint therefore stalls the next
    // tick; the request timeout bounds how long.
    let poll_interval = Duration::from_secs(config.poll_interval_secs.max(1));
    let mut next_poll = Instant::now() + poll_interval;

    event_loop.run(move |event, _target, control_flow| {
        *control_flow = ControlFlow::WaitUntil(next_poll);

        match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                shell.poll_feed();
                next_poll = Instant::now() + poll_interval;
                *control_flow = ControlFlow::WaitUntil(next_poll);
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                window.set_visible(false);
                shell.detach_ui();
                *control_flow = ControlFlow::Exit;
            }
            Event::MainEventsCleared => {
                shell.pump();
            }
            _ => {}
        }
    });
}
