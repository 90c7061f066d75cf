//! Climate map viewer CLI.
//!
//! Drives the map engine headlessly against the climate data API:
//! - `health` / `metadata`: probe the API
//! - `render`: one load cycle, one composed frame written as PNG
//! - `probe`: the value and tooltip under a screen point
//! - `chat`: send a chat message and apply the returned state patch
//! - `replay`: replay a scripted interaction session, writing frames

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use climate_client::{ApiClient, ClimateApi};
use climate_common::Resolution;
use map_view::{BaseMapOverlay, TooltipUpdate, ViewportTransform};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use climate_viewer::{border_source, build_view, LoadStatus, ReplayScript, Replayer, Session, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "climate-viewer")]
#[command(about = "Headless climate map viewer")]
struct Args {
    /// Viewer configuration file (YAML)
    #[arg(long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the API is reachable
    Health,

    /// Print the variable/model/scenario catalogue
    Metadata,

    /// Load a selection and write one frame
    Render {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        view: ViewArgs,
        /// Output PNG path
        #[arg(long, default_value = "frame.png")]
        out: PathBuf,
    },

    /// Report the value under a screen point
    Probe {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },

    /// Send a chat message and apply the reply
    Chat {
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        message: String,
        /// Write the resulting frame here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replay a scripted interaction session
    Replay {
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        script: PathBuf,
        #[arg(long, default_value = "frames")]
        out_dir: PathBuf,
    },
}

/// Overrides of the configured default selection.
#[derive(ClapArgs, Debug, Default)]
struct Selection {
    #[arg(long)]
    variable: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    scenario: Option<String>,
    /// ISO date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    palette: Option<String>,
    /// Display unit, e.g. °C
    #[arg(long)]
    unit: Option<String>,
    /// low, medium or high
    #[arg(long)]
    resolution: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct ViewArgs {
    #[arg(long, default_value = "1.0")]
    zoom: f64,
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pan_x: f64,
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pan_y: f64,
}

impl ViewArgs {
    fn transform(&self) -> ViewportTransform {
        ViewportTransform::new(self.zoom, self.pan_x, self.pan_y)
    }
}

impl Selection {
    fn apply(&self, config: &mut ViewerConfig) -> Result<()> {
        let defaults = &mut config.defaults;
        if let Some(v) = &self.variable {
            defaults.variable = v.clone();
        }
        if let Some(m) = &self.model {
            defaults.model = m.clone();
        }
        if let Some(s) = &self.scenario {
            defaults.scenario = s.clone();
        }
        if let Some(d) = &self.date {
            defaults.date = d.clone();
        }
        if let Some(u) = &self.unit {
            defaults.unit = Some(u.clone());
        }
        if let Some(r) = &self.resolution {
            defaults.resolution = serde_json::from_value::<Resolution>(serde_json::json!(r))
                .with_context(|| format!("Invalid resolution '{}'", r))?;
        }
        if let Some(p) = &self.palette {
            config.map.palette = p.clone();
        }
        config.validate()
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let mut config = ViewerConfig::load_or_default(args.config.as_deref())?;
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }
    let client = ApiClient::new(config.api.client_config()).context("Failed to create API client")?;
    info!(base_url = %client.base_url(), "Climate viewer starting");

    match args.command {
        Command::Health => {
            if client.health().await {
                println!("available");
            } else {
                println!("unavailable");
            }
        }
        Command::Metadata => {
            let metadata = client.metadata().await.context("Failed to fetch metadata")?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Render { selection, view, out } => {
            selection.apply(&mut config)?;
            let mut session = open_session(&config, client, true).await?;
            report_load(session.load().await)?;
            session.view_mut().set_transform(view.transform());
            write_frame(&mut session, &out)?;
        }
        Command::Probe { selection, view, x, y } => {
            selection.apply(&mut config)?;
            let mut session = open_session(&config, client, false).await?;
            report_load(session.load().await)?;
            session.view_mut().set_transform(view.transform());
            match session.view().lookup(x, y) {
                Some(point) => {
                    println!("value: {}", point.value);
                    println!("pixel: {:?}", point.pixel);
                }
                None => println!("no value at ({}, {})", x, y),
            }
            if let TooltipUpdate::Show { text, legend_fraction, .. } = session.view().tooltip_at(x, y) {
                println!("{}", text);
                println!("legend: {:.3}", legend_fraction);
            }
        }
        Command::Chat { selection, message, out } => {
            selection.apply(&mut config)?;
            let mut session = open_session(&config, client, out.is_some()).await?;
            report_load(session.load().await)?;
            let outcome = session
                .chat(&message)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", outcome.reply);
            if let Some(status) = &outcome.status {
                report_load(status.clone())?;
            }
            if let Some(out) = out {
                write_frame(&mut session, &out)?;
            }
        }
        Command::Replay { selection, script, out_dir } => {
            selection.apply(&mut config)?;
            let steps = ReplayScript::load(&script)?;
            let overlay = BaseMapOverlay::new();
            let mut replayer = Replayer::new(config.slider.debounce()).with_out_dir(&out_dir);

            if config.overlay.enabled {
                let flag = replayer.overlay_flag();
                overlay.spawn_load(border_source(&config, client.clone()), move || {
                    flag.store(true, Ordering::Release);
                });
            }

            let view = build_view(&config, overlay)?;
            let mut session = Session::new(Arc::new(client), view, config.initial_state()?)?;
            report_load(session.load().await)?;

            let report = replayer.run(&mut session, &steps).await?;
            println!(
                "{} steps, {} frames in {}, {} loads, {} errors",
                report.steps,
                report.frames.len(),
                out_dir.display(),
                report.loads.len(),
                report.errors.len()
            );
            for error in &report.errors {
                println!("error: {}", error);
            }
        }
    }

    Ok(())
}

/// Build a session; with `overlay` the base map is fetched before returning.
async fn open_session(config: &ViewerConfig, client: ApiClient, overlay: bool) -> Result<Session> {
    let base_map = BaseMapOverlay::new();
    if overlay && config.overlay.enabled {
        let source = border_source(config, client.clone());
        if let Err(e) = base_map.load(source.as_ref()).await {
            warn!(error = %e, "Drawing without base-map overlay");
        }
    }
    let view = build_view(config, base_map)?;
    let api: Arc<dyn ClimateApi> = Arc::new(client);
    Ok(Session::new(api, view, config.initial_state()?)?)
}

fn report_load(status: LoadStatus) -> Result<()> {
    match status {
        LoadStatus::Failed(message) => bail!(message),
        LoadStatus::NoData => {
            warn!("No data for this selection");
            Ok(())
        }
        _ => Ok(()),
    }
}

fn write_frame(session: &mut Session, out: &Path) -> Result<()> {
    session.view_mut().redraw();
    let png = session.view().encode_frame().context("Failed to encode frame")?;
    std::fs::write(out, png).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), "Frame written");
    Ok(())
}
