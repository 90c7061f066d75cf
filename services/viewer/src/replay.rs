//! Scripted interaction replay.
//!
//! A script is a YAML list of steps, each a single-key map:
//!
//! ```yaml
//! steps:
//!   - pointer: { type: wheel, x: 640, y: 320, delta_y: -1 }
//!   - pointer: { type: move, x: 100, y: 80 }
//!   - slider: "2051-01-01"
//!   - wait_ms: 400
//!   - chat: "show precipitation"
//!   - patch: { colorPalette: magma }
//!   - resize: { width: 800, height: 400, device_pixel_ratio: 2.0 }
//! ```
//!
//! Slider ticks go through the debouncer; a frame is written after each step.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use climate_client::Debouncer;
use climate_common::{catalog, StatePatch};
use map_view::{PointerEvent, TooltipUpdate};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::{LoadStatus, Session, SessionError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// One step as written in YAML; exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    #[serde(default)]
    pub pointer: Option<PointerEvent>,
    #[serde(default)]
    pub slider: Option<String>,
    #[serde(default)]
    pub wait_ms: Option<u64>,
    #[serde(default)]
    pub chat: Option<String>,
    #[serde(default)]
    pub patch: Option<serde_json::Value>,
    #[serde(default)]
    pub resize: Option<ResizeSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f32,
}

fn default_dpr() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Pointer(PointerEvent),
    Slider(NaiveDate),
    Wait(Duration),
    Chat(String),
    Patch(serde_json::Value),
    Resize(ResizeSpec),
}

impl StepSpec {
    fn into_step(self, index: usize) -> Result<ReplayStep> {
        let mut steps = Vec::new();
        if let Some(event) = self.pointer {
            steps.push(ReplayStep::Pointer(event));
        }
        if let Some(date) = self.slider {
            let date = catalog::parse_date(&date).with_context(|| format!("step {}", index))?;
            steps.push(ReplayStep::Slider(date));
        }
        if let Some(ms) = self.wait_ms {
            steps.push(ReplayStep::Wait(Duration::from_millis(ms)));
        }
        if let Some(message) = self.chat {
            steps.push(ReplayStep::Chat(message));
        }
        if let Some(patch) = self.patch {
            steps.push(ReplayStep::Patch(patch));
        }
        if let Some(resize) = self.resize {
            steps.push(ReplayStep::Resize(resize));
        }

        match steps.len() {
            1 => Ok(steps.remove(0)),
            0 => bail!("step {} is empty", index),
            n => bail!("step {} has {} actions, expected one", index, n),
        }
    }
}

impl ReplayScript {
    pub fn from_yaml(yaml: &str) -> Result<Vec<ReplayStep>> {
        let script: ReplayScript = serde_yaml::from_str(yaml).context("Failed to parse replay script")?;
        script
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, spec)| spec.into_step(i))
            .collect()
    }

    pub fn load(path: &Path) -> Result<Vec<ReplayStep>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
        Self::from_yaml(&content)
    }
}

/// What happened during a replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub steps: usize,
    pub frames: Vec<PathBuf>,
    pub tooltips: Vec<TooltipUpdate>,
    pub loads: Vec<LoadStatus>,
    pub errors: Vec<String>,
}

pub struct Replayer {
    debouncer: Debouncer,
    commits_tx: mpsc::UnboundedSender<NaiveDate>,
    commits_rx: mpsc::UnboundedReceiver<NaiveDate>,
    overlay_ready: Arc<AtomicBool>,
    out_dir: Option<PathBuf>,
}

impl Replayer {
    pub fn new(debounce: Duration) -> Self {
        let (commits_tx, commits_rx) = mpsc::unbounded_channel();
        Self {
            debouncer: Debouncer::new(debounce),
            commits_tx,
            commits_rx,
            overlay_ready: Arc::new(AtomicBool::new(false)),
            out_dir: None,
        }
    }

    /// Write a PNG frame after every step into `dir`.
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// Flag raised by the overlay loader once base-map data arrives.
    pub fn overlay_flag(&self) -> Arc<AtomicBool> {
        self.overlay_ready.clone()
    }

    pub async fn run(&mut self, session: &mut Session, steps: &[ReplayStep]) -> Result<ReplayReport> {
        if let Some(dir) = &self.out_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }

        let mut report = ReplayReport::default();
        for (index, step) in steps.iter().enumerate() {
            debug!(index, ?step, "Replay step");
            self.step(session, step, &mut report).await;
            self.drain_commits(session, &mut report).await;
            if self.overlay_ready.swap(false, Ordering::AcqRel) {
                info!("Base-map overlay arrived, redrawing");
            }
            self.write_frame(session, index, &mut report)?;
            report.steps += 1;
        }

        if self.debouncer.is_pending() {
            tokio::time::sleep(self.debouncer.delay() + Duration::from_millis(20)).await;
            if self.drain_commits(session, &mut report).await {
                self.write_frame(session, steps.len(), &mut report)?;
            }
        }

        info!(
            steps = report.steps,
            frames = report.frames.len(),
            loads = report.loads.len(),
            errors = report.errors.len(),
            "Replay finished"
        );
        Ok(report)
    }

    async fn step(&mut self, session: &mut Session, step: &ReplayStep, report: &mut ReplayReport) {
        match step {
            ReplayStep::Pointer(event) => {
                let outcome = session.view_mut().handle_pointer(*event);
                if let Some(tooltip) = outcome.tooltip {
                    match &tooltip {
                        TooltipUpdate::Show { text, x, y, .. } => {
                            info!(text = %text.replace('\n', " | "), x, y, "Tooltip shown")
                        }
                        TooltipUpdate::Hide => debug!("Tooltip hidden"),
                    }
                    report.tooltips.push(tooltip);
                }
            }
            ReplayStep::Slider(date) => {
                let tx = self.commits_tx.clone();
                let date = *date;
                self.debouncer.call(move || async move {
                    tx.send(date).ok();
                });
            }
            ReplayStep::Wait(duration) => tokio::time::sleep(*duration).await,
            ReplayStep::Chat(message) => match session.chat(message).await {
                Ok(outcome) => {
                    info!(reply = %outcome.reply, "Chat reply");
                    report.loads.extend(outcome.status);
                }
                Err(e) => record_error(report, e),
            },
            ReplayStep::Patch(new_state) => {
                let result = match StatePatch::parse_all(new_state) {
                    Ok(patches) => session.apply_patches(&patches).await,
                    Err(e) => Err(e.into()),
                };
                match result {
                    Ok((_, status)) => report.loads.extend(status),
                    Err(e) => record_error(report, e),
                }
            }
            ReplayStep::Resize(resize) => {
                let result =
                    session
                        .view_mut()
                        .resize(resize.width, resize.height, resize.device_pixel_ratio);
                if let Err(e) = result {
                    record_error(report, e.into());
                }
            }
        }
    }

    /// Apply slider dates committed by the debouncer. Returns whether any were.
    async fn drain_commits(&mut self, session: &mut Session, report: &mut ReplayReport) -> bool {
        let mut applied = false;
        while let Ok(date) = self.commits_rx.try_recv() {
            info!(%date, "Slider committed");
            match session.set_date(date).await {
                Ok((_, status)) => report.loads.extend(status),
                Err(e) => record_error(report, e),
            }
            applied = true;
        }
        applied
    }

    fn write_frame(&self, session: &mut Session, index: usize, report: &mut ReplayReport) -> Result<()> {
        session.view_mut().redraw();
        let Some(dir) = &self.out_dir else {
            return Ok(());
        };
        let png = session
            .view()
            .encode_frame()
            .context("Failed to encode frame")?;
        let path = dir.join(format!("frame_{:03}.png", index));
        std::fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        report.frames.push(path);
        Ok(())
    }
}

fn record_error(report: &mut ReplayReport, error: SessionError) {
    warn!(error = %error, "Replay step failed");
    report.errors.push(error.user_message());
}
