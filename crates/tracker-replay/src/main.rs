//! Tracker Replay CLI
//!
//! Drives a session without a renderer and prints one JSON frame per tick.
//!
//! Usage:
//!   tracker-replay --tle data/stations.txt --ticks 120 --step-ms 1000 \
//!                  --speed 50 --start 2020-07-12T21:16:01Z > frames.jsonl
//!
//! Logs go to stderr so stdout stays a clean JSON-lines stream.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use iss_tracker::{parse_catalog, NodeId, TrackerConfig, TrackerSession};
use orbital_mechanics::OrbitalElementSet;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "tracker-replay",
    about = "Replay tracker frames for a set of element sets"
)]
struct Args {
    /// Three-line element file (name, line 1, line 2 per record)
    #[arg(short, long)]
    tle: PathBuf,

    /// Tracker config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to emit
    #[arg(short = 'n', long, default_value_t = 60)]
    ticks: u32,

    /// Real time between frames in milliseconds
    #[arg(long, default_value_t = 1000)]
    step_ms: i64,

    /// Speed multiplier applied before the first frame
    #[arg(short, long, default_value_t = 1.0, allow_negative_numbers = true)]
    speed: f64,

    /// Real start instant (RFC 3339); defaults to now
    #[arg(long, value_parser = parse_start)]
    start: Option<DateTime<Utc>>,

    /// Catalog number to focus; 0 focuses Earth
    #[arg(short, long)]
    focus: Option<NodeId>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_start(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tracker_replay=debug,iss_tracker=debug"
    } else {
        "tracker_replay=info,iss_tracker=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<TrackerConfig> {
    let config = match path {
        Some(path) => TrackerConfig::from_file(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => TrackerConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// The configured home satellite is registered first when present; every
/// other record is added in file order.
fn build_session(
    config: TrackerConfig,
    sets: Vec<OrbitalElementSet>,
    start: DateTime<Utc>,
) -> Result<TrackerSession> {
    let home_id = config.home_catalog_id;
    let mut session = TrackerSession::new(config, start)?;

    let (home, others): (Vec<_>, Vec<_>) =
        sets.into_iter().partition(|s| s.catalog_id() == home_id);
    if let Some(home) = home.into_iter().next() {
        session.add_home(home, start)?;
    }
    for set in others {
        let name = set.name().to_string();
        session
            .add_node(set, Vec::new(), start)
            .with_context(|| format!("failed to add {}", name))?;
    }

    if session.focused_node().is_none() {
        if let Some(first) = session.nodes().first().map(|n| n.id()) {
            session.set_focus(Some(first))?;
        }
    }

    // No assets to wait for
    let ids: Vec<NodeId> = session.nodes().iter().map(|n| n.id()).collect();
    for id in ids {
        session.mark_loaded(id)?;
    }
    Ok(session)
}

fn replay(
    session: &TrackerSession,
    args: &Args,
    start: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    for i in 0..args.ticks {
        let real_now = start + Duration::milliseconds(args.step_ms * i64::from(i));
        let frame = session.tick(real_now);
        debug!(tick = i, simulated = %frame.simulated_at, "frame");

        serde_json::to_writer(&mut *out, &frame)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("Tracker replay");

    let config = load_config(args.config.as_ref())?;

    let text = fs::read_to_string(&args.tle)
        .with_context(|| format!("failed to read {:?}", args.tle))?;
    let sets = parse_catalog(&text);
    if sets.is_empty() {
        bail!("no valid element sets in {:?}", args.tle);
    }
    info!("Loaded {} element sets from {:?}", sets.len(), args.tle);

    let start = args.start.unwrap_or_else(Utc::now);
    let mut session = build_session(config, sets, start)?;

    session.time_mut().set_speed(args.speed, start);
    match args.focus {
        Some(0) => session.set_focus(None)?,
        Some(id) => session.set_focus(Some(id))?,
        None => {}
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    replay(&session, &args, start, &mut out)?;

    info!("Replayed {} ticks at {}×", args.ticks, args.speed);
    Ok(())
}
