use anyhow::{Context, Result};
use boid_runner::{build_flock, load_config, Args, Runner};
use clap::Parser;
use std::io::{self, BufWriter};
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Boid runner starting...");

    let config = load_config(&args).context("Failed to load configuration")?;
    log::info!("Boids: {}", config.boid_count);
    log::info!("Screen: {}x{}", config.width, config.height);
    match config.seed {
        Some(seed) => log::info!("Seed: {}", seed),
        None => log::info!("Seed: random"),
    }

    let flock = build_flock(&config).context("Failed to initialize flock")?;
    let mut runner = Runner::new(flock);

    if args.control_stdin {
        log::info!("Reading control updates from stdin");
        // Detached: the reader blocks on stdin until the process exits.
        let _ = runner
            .control_surface()
            .spawn(io::BufReader::new(io::stdin()));
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let status = runner
        .run(
            args.ticks,
            Duration::from_millis(config.tick_interval_ms),
            args.snapshot_every,
            &mut out,
        )
        .context("Simulation error")?;

    log::info!(
        "Finished at tick {}: {} boids, {} biased, {} updates applied, {} rejected",
        status.tick,
        status.boid_count,
        status.biased_count,
        status.updates_applied,
        status.updates_rejected
    );

    Ok(())
}
