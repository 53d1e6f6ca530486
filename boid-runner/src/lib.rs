use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use boid_core::{Behavior, Flock, FlockParameters};
use boid_shared::{ControlUpdate, SimulationConfig, StatusResponse};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless boid flock simulation", long_about = None)]
pub struct Args {
    /// JSON config file; command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of boids
    #[arg(short = 'n', long)]
    pub boids: Option<usize>,

    /// Screen width
    #[arg(long)]
    pub width: Option<f32>,

    /// Screen height
    #[arg(long)]
    pub height: Option<f32>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of ticks to run; runs until killed when omitted
    #[arg(short, long)]
    pub ticks: Option<u64>,

    /// Milliseconds between ticks (0 runs as fast as possible)
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Parameter override, e.g. --set "Max Speed=5" (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Disable a behavior, e.g. --disable bias (repeatable)
    #[arg(long, value_name = "BEHAVIOR")]
    pub disable: Vec<String>,

    /// Print a snapshot every N ticks (0 prints only the final state)
    #[arg(long, default_value_t = 1)]
    pub snapshot_every: u64,

    /// Read JSON control updates from stdin while running
    #[arg(long)]
    pub control_stdin: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// Splits a `NAME=VALUE` parameter assignment.
pub fn parse_assignment(assignment: &str) -> Result<(String, f32)> {
    let (name, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", assignment))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing parameter name in '{}'", assignment);
    }
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for parameter '{}'", name))?;
    Ok((name.to_string(), value))
}

/// Loads the config file (if any) and applies command-line overrides.
pub fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SimulationConfig::from_json(&json)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(boids) = args.boids {
        config.boid_count = boids;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(interval) = args.interval_ms {
        config.tick_interval_ms = interval;
    }

    for assignment in &args.set {
        let (name, value) = parse_assignment(assignment)?;
        config.parameters.insert(name, value);
    }
    for name in &args.disable {
        let behavior: Behavior = name
            .parse()
            .with_context(|| format!("Cannot disable '{}'", name))?;
        config.enabled.insert(behavior.name().to_string(), false);
    }

    if !(config.width > 0.0 && config.height > 0.0) {
        bail!(
            "Screen size must be positive, got {}x{}",
            config.width,
            config.height
        );
    }

    Ok(config)
}

/// Builds the flock, failing on any config entry the core rejected.
pub fn build_flock(config: &SimulationConfig) -> Result<Flock> {
    let (flock, rejected) = Flock::from_config(config);
    if !rejected.is_empty() {
        bail!(
            "Unknown or out-of-range config entries: {}",
            rejected.join(", ")
        );
    }
    log::info!(
        "Flock ready: {} boids ({} biased) on {}x{}",
        flock.len(),
        flock.biased_count(),
        config.width,
        config.height
    );
    Ok(flock)
}

#[derive(Debug, Default)]
struct UpdateCounts {
    applied: AtomicUsize,
    rejected: AtomicUsize,
}

impl UpdateCounts {
    fn record(&self, applied: bool) {
        let counter = if applied {
            &self.applied
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Control-surface side of a running simulation.
///
/// Parameter and flag writes go straight into the shared parameters and are
/// picked up by the next tick. Resize and rebias need the flock itself and
/// are queued for the tick loop.
pub struct ControlSurface {
    parameters: Arc<FlockParameters>,
    queue: Sender<ControlUpdate>,
    counts: Arc<UpdateCounts>,
}

impl ControlSurface {
    /// Applies one update. Returns `false` if it was rejected immediately.
    pub fn handle(&self, update: ControlUpdate) -> bool {
        match self.parameters.apply_update(&update) {
            Some(applied) => {
                if !applied {
                    log::warn!("Rejected control update {:?}", update);
                }
                self.counts.record(applied);
                applied
            }
            None => self.queue.send(update).is_ok(),
        }
    }

    /// Parses and applies one JSON line. Blank lines are ignored.
    pub fn handle_line(&self, line: &str) -> Result<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }
        let update = ControlUpdate::from_json(line)
            .with_context(|| format!("Invalid control update: {}", line.trim()))?;
        Ok(self.handle(update))
    }

    /// Reads JSON control updates from `reader` on a background thread until
    /// it reaches end of input.
    pub fn spawn<R>(self, reader: R) -> JoinHandle<()>
    where
        R: BufRead + Send + 'static,
    {
        std::thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("Control input closed: {}", e);
                        break;
                    }
                };
                if let Err(e) = self.handle_line(&line) {
                    log::warn!("{:#}", e);
                    self.counts.record(false);
                }
            }
            log::debug!("Control input finished");
        })
    }
}

/// Tick driver: owns the flock and applies queued control updates between
/// ticks.
pub struct Runner {
    flock: Flock,
    queue: Receiver<ControlUpdate>,
    sender: Sender<ControlUpdate>,
    counts: Arc<UpdateCounts>,
}

impl Runner {
    pub fn new(flock: Flock) -> Self {
        let (sender, queue) = mpsc::channel();
        Self {
            flock,
            queue,
            sender,
            counts: Arc::new(UpdateCounts::default()),
        }
    }

    /// A control surface feeding this runner.
    pub fn control_surface(&self) -> ControlSurface {
        ControlSurface {
            parameters: self.flock.parameters().clone(),
            queue: self.sender.clone(),
            counts: self.counts.clone(),
        }
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    fn drain_queue(&mut self) {
        while let Ok(update) = self.queue.try_recv() {
            let applied = self.flock.apply_update(&update);
            if !applied {
                log::warn!("Rejected control update {:?}", update);
            }
            self.counts.record(applied);
        }
    }

    /// Applies queued updates, then advances the flock one tick.
    pub fn step(&mut self) {
        self.drain_queue();
        self.flock.tick();
    }

    /// Runs `ticks` ticks (forever when `None`), writing a JSON snapshot line
    /// to `out` every `snapshot_every` ticks and once more at the end.
    pub fn run<W: Write>(
        &mut self,
        ticks: Option<u64>,
        interval: Duration,
        snapshot_every: u64,
        out: &mut W,
    ) -> Result<StatusResponse> {
        let started = Instant::now();
        let mut last_written = None;

        while ticks.map_or(true, |limit| self.flock.tick_count() < limit) {
            let tick_started = Instant::now();
            self.step();

            let tick = self.flock.tick_count();
            if snapshot_every > 0 && tick % snapshot_every == 0 {
                self.write_snapshot(out)?;
                last_written = Some(tick);
            }

            if let Some(remaining) = interval.checked_sub(tick_started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        self.drain_queue();
        if last_written != Some(self.flock.tick_count()) {
            self.write_snapshot(out)?;
        }

        let elapsed = started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            log::info!(
                "Ran {} ticks in {:.2}s ({:.1} ticks/s)",
                self.flock.tick_count(),
                elapsed,
                self.flock.tick_count() as f64 / elapsed
            );
        }

        Ok(self.status())
    }

    fn write_snapshot<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *out, &self.flock.state())
            .context("Failed to serialize snapshot")?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            boid_count: self.flock.len(),
            tick: self.flock.tick_count(),
            biased_count: self.flock.biased_count(),
            updates_applied: self.counts.applied.load(Ordering::Relaxed),
            updates_rejected: self.counts.rejected.load(Ordering::Relaxed),
        }
    }
}
