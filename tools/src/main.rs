//! telemetry-runner: headless generator for the synthetic game database.
//!
//! Usage:
//!   telemetry-runner --seed 131287 --db mock_game.db
//!   telemetry-runner --config data/generator_config.json --days 30 --players 1000 --peak-dau 500
//!   telemetry-runner --db run.db --overwrite --report run_report.json

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::env;
use std::path::Path;
use telemetry_core::{
    activity::DayOutcome, config::SimConfig, engine::SimEngine, store::SimStore,
};

#[derive(Serialize)]
struct RunSummary<'a> {
    seed: u64,
    start_date: String,
    horizon_days: u32,
    players: usize,
    teams: usize,
    memberships: usize,
    sessions: usize,
    events: usize,
    purchases: usize,
    revenue_eur_cents: i64,
    shortfall_days: usize,
    days: &'a [DayOutcome],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = parse_opt::<String>(&args, "--db").unwrap_or_else(|| "mock_game.db".to_string());
    let overwrite = args.iter().any(|a| a == "--overwrite");

    let mut config = match parse_opt::<String>(&args, "--config") {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = parse_opt(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(days) = parse_opt(&args, "--days") {
        config.horizon_days = days;
    }
    if let Some(players) = parse_opt(&args, "--players") {
        config.player_count = players;
    }
    if let Some(peak) = parse_opt(&args, "--peak-dau") {
        config.peak_dau = peak;
    }
    if let Some(raw) = parse_opt::<String>(&args, "--start-date") {
        config.start_date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("--start-date {raw} is not YYYY-MM-DD"))?;
    }

    println!("Synthetic game telemetry - telemetry-runner");
    println!("  seed:      {}", config.seed);
    println!("  start:     {}", config.start_date);
    println!("  days:      {}", config.horizon_days);
    println!("  players:   {}", config.player_count);
    println!("  peak DAU:  {}", config.peak_dau);
    println!("  db:        {db}");
    println!();

    if db != ":memory:" && Path::new(&db).exists() {
        if !overwrite {
            bail!("{db} already exists; pass --overwrite to replace it");
        }
        std::fs::remove_file(&db).with_context(|| format!("removing {db}"))?;
    }

    let engine = SimEngine::new(config)?;
    let mut store = SimStore::open(&db)?;
    store.migrate()?;
    let dataset = engine.run_into(&mut store)?;

    let revenue: i64 = dataset.purchases.iter().map(|p| p.price_eur).sum();
    let shortfall_days = dataset.report.shortfall_days().count();

    println!("=== Generation Summary ===");
    println!("  Players:            {}", dataset.players.len());
    println!("  Teams:              {}", dataset.teams.len());
    println!("  Memberships:        {}", dataset.memberships.len());
    println!("  Sessions:           {}", dataset.sessions.len());
    println!("  Events:             {}", dataset.events.len());
    println!("  Purchases:          {}", dataset.purchases.len());
    println!("  Revenue (EUR):      {:.2}", revenue as f64 / 100.0);
    println!("  Player-days:        {}", dataset.activity.total_player_days());
    println!(
        "  Shortfall days:     {shortfall_days} (total missing {})",
        dataset.report.total_shortfall()
    );
    for day in dataset.report.shortfall_days().take(10) {
        println!(
            "    day {:>4}: target {:>6}  achieved {:>6}  eligible {:>6}",
            day.day, day.target, day.achieved, day.eligible
        );
    }

    if let Some(mau) = store.monthly_active_users()?.last() {
        println!("  Last month MAU:     {} ({})", mau.count, mau.period);
    }
    for row in store.variant_retention(&engine.config.experiment.name)? {
        println!(
            "  {:<8} cohort {:>6}  D1 {:.3}  D7 {:.3}  D30 {:.3}",
            row.cohort,
            row.cohort_size,
            row.d1(),
            row.d7(),
            row.d30()
        );
    }

    if let Some(path) = parse_opt::<String>(&args, "--report") {
        let summary = RunSummary {
            seed: dataset.seed,
            start_date: dataset.start_date.to_string(),
            horizon_days: dataset.dau_targets.len() as u32,
            players: dataset.players.len(),
            teams: dataset.teams.len(),
            memberships: dataset.memberships.len(),
            sessions: dataset.sessions.len(),
            events: dataset.events.len(),
            purchases: dataset.purchases.len(),
            revenue_eur_cents: revenue,
            shortfall_days,
            days: &dataset.report.days,
        };
        let file = std::fs::File::create(&path).with_context(|| format!("creating {path}"))?;
        serde_json::to_writer_pretty(file, &summary)?;
        println!("  Report written to {path}");
    }

    log::info!("runner: seed={} finished", dataset.seed);
    Ok(())
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
}
