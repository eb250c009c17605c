//! BetDesk CLI
//!
//! Run jobs by hand, inspect alerts and query the models.

use anyhow::{Context, Result};
use betdesk::dashboard::view::{render_stat_cards, render_table};
use betdesk::dashboard::{ApiAlert, DashboardClient, DashboardStats, FilterState};
use betdesk::db::AlertQuery;
use betdesk::decision::robust_stats::format_analysis_summary;
use betdesk::decision::tennis::{analyze_tennis_match, best_of};
use betdesk::decision::RobustStatsEngine;
use betdesk::jobs::{self, JobContext};
use betdesk::services::Metrics;
use betdesk::types::GameResult;
use betdesk::{Config, Database, Sport};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "betdesk")]
#[command(about = "Odds monitor with anomaly and EV+ alerts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScanKind {
    Anomalies,
    Ev,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server and the scheduler
    Serve,

    /// Discover events and store odds once
    Ingest {
        /// basketball, football or tennis (default: all)
        #[arg(short, long)]
        sport: Option<String>,
    },

    /// Run the alert scans once over the stored snapshot
    Scan {
        /// basketball, football or tennis (default: all)
        #[arg(short, long)]
        sport: Option<String>,

        #[arg(short, long, value_enum, default_value = "all")]
        kind: ScanKind,
    },

    /// Fetch the smoke page and check it looks like HTML
    Smoke,

    /// Show recent alerts
    Alerts {
        #[arg(short, long)]
        sport: Option<String>,

        /// ev+ or anomalia
        #[arg(short = 't', long = "type")]
        alert_type: Option<String>,

        /// TOTAL, SPREAD, MONEYLINE, 1X2 or BTTS
        #[arg(short, long)]
        market: Option<String>,

        #[arg(long)]
        league: Option<String>,

        /// sent or pending
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long, default_value = "50")]
        limit: i64,

        /// Read the local database instead of the API
        #[arg(long)]
        local: bool,
    },

    /// Alert totals from the database
    Stats,

    /// Head-to-head, form and totals trends for a basketball matchup
    Analyze {
        home: String,
        away: String,
        #[arg(short, long, default_value = "NBA")]
        league: String,
    },

    /// Elo based tennis match analysis
    Tennis {
        player1: String,
        player2: String,
        #[arg(long, default_value = "2000")]
        elo1: f64,
        #[arg(long, default_value = "2000")]
        elo2: f64,
        #[arg(long, default_value = "hard")]
        surface: String,
        /// Used to pick best of 3 or 5
        #[arg(short, long, default_value = "ATP")]
        league: String,
    },

    /// Record a finished game for the stats engines
    AddResult {
        sport: String,
        league: String,
        home: String,
        away: String,
        home_score: i64,
        away_score: i64,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Create the database schema
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => betdesk::api::serve(config).await?,
        Commands::Ingest { sport } => run_ingest(config, sport.as_deref()).await?,
        Commands::Scan { sport, kind } => run_scan(config, sport.as_deref(), kind).await?,
        Commands::Smoke => run_smoke(config).await?,
        Commands::Alerts {
            sport,
            alert_type,
            market,
            league,
            status,
            limit,
            local,
        } => {
            let filters = build_filters(sport, alert_type, market, league, status)?;
            show_alerts(&config, filters, limit, local).await?
        }
        Commands::Stats => show_stats(&config).await?,
        Commands::Analyze { home, away, league } => analyze(&config, &home, &away, &league).await?,
        Commands::Tennis {
            player1,
            player2,
            elo1,
            elo2,
            surface,
            league,
        } => tennis(&player1, &player2, elo1, elo2, &surface, &league),
        Commands::AddResult {
            sport,
            league,
            home,
            away,
            home_score,
            away_score,
            date,
        } => {
            let game = GameResult {
                sport: sport.parse::<Sport>().map_err(anyhow::Error::msg)?.to_string(),
                league,
                home_team: home,
                away_team: away,
                home_score,
                away_score,
                game_date: parse_date(date.as_deref())?,
            };
            add_result(&config, &game).await?
        }
        Commands::InitDb => {
            Database::new(&config.database_path).await?;
            println!("{} {}", "Database ready:".green().bold(), config.database_path);
        }
    }

    Ok(())
}

fn sports(sport: Option<&str>) -> Result<Vec<Sport>> {
    match sport {
        Some(s) => Ok(vec![s.parse::<Sport>().map_err(anyhow::Error::msg)?]),
        None => Ok(Sport::ALL.to_vec()),
    }
}

fn parse_date(date: Option<&str>) -> Result<chrono::DateTime<Utc>> {
    let Some(date) = date else {
        return Ok(Utc::now());
    };
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
    Ok(day.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
}

async fn job_context(config: Config) -> Result<JobContext> {
    let db = Database::new(&config.database_path).await?;
    JobContext::new(Arc::new(db), Arc::new(config), Metrics::new())
}

fn header(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("  {}", title.bold());
    println!("{}\n", "=".repeat(70));
}

async fn run_ingest(config: Config, sport: Option<&str>) -> Result<()> {
    let sports = sports(sport)?;
    let ctx = job_context(config).await?;
    header("INGEST");

    for sport in sports {
        let summary = jobs::run_ingest(&ctx, sport).await?;
        println!(
            "  {} {:<12} events: {:>4}  odds: {:>6}  skipped: {:>4}",
            sport.emoji(),
            sport.label_es(),
            summary.events,
            summary.odds,
            summary.skipped
        );
    }
    Ok(())
}

async fn run_scan(config: Config, sport: Option<&str>, kind: ScanKind) -> Result<()> {
    let sports = sports(sport)?;
    let ctx = job_context(config).await?;
    header("SCAN");

    for sport in sports {
        if matches!(kind, ScanKind::Anomalies | ScanKind::All) {
            let s = jobs::run_anomalies(&ctx, sport).await?;
            println!(
                "  {} {:<12} {:<10} rows: {:>5}  hits: {:>3}  alerts: {:>3}  sent: {:>3}",
                sport.emoji(),
                sport.label_es(),
                "anomalias",
                s.rows,
                s.candidates,
                s.alerts,
                s.delivered
            );
        }
        if matches!(kind, ScanKind::Ev | ScanKind::All) {
            let s = if sport == Sport::Basketball {
                jobs::run_basketball_ev(&ctx).await?
            } else {
                jobs::run_model_ev(&ctx, sport).await?
            };
            println!(
                "  {} {:<12} {:<10} rows: {:>5}  picks: {:>3}  alerts: {:>3}  sent: {:>3}",
                sport.emoji(),
                sport.label_es(),
                "ev+",
                s.rows,
                s.candidates,
                s.alerts,
                s.delivered
            );
            if s.pricing_errors > 0 {
                println!("    {} {}", "pricing errors:".red().bold(), s.pricing_errors);
            }
        }
    }
    Ok(())
}

async fn run_smoke(config: Config) -> Result<()> {
    let ctx = job_context(config).await?;
    let len = jobs::run_smoke(&ctx).await?;
    println!("{} {} ({} bytes)", "Smoke OK:".green().bold(), ctx.config.scheduler.smoke_url, len);
    Ok(())
}

fn build_filters(
    sport: Option<String>,
    alert_type: Option<String>,
    market: Option<String>,
    league: Option<String>,
    status: Option<String>,
) -> Result<FilterState> {
    let mut filters = FilterState::default();
    if let Some(s) = sport {
        filters.sport = s.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(t) = alert_type {
        filters.alert_type = t.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(m) = market {
        filters.market = m.parse().map_err(anyhow::Error::msg)?;
    }
    filters.league = league.unwrap_or_default();
    filters.sent = status
        .as_deref()
        .and_then(betdesk::dashboard::filters::parse_status);
    Ok(filters)
}

fn sport_param(filters: &FilterState) -> Option<&'static str> {
    (filters.sport != betdesk::dashboard::types::Sport::All).then(|| filters.sport.as_str())
}

async fn show_alerts(config: &Config, filters: FilterState, limit: i64, local: bool) -> Result<()> {
    let alerts: Vec<ApiAlert> = if local {
        let db = Database::new(&config.database_path).await?;
        let records = db
            .query_alerts(&AlertQuery {
                limit,
                ..AlertQuery::default()
            })
            .await?;
        records.iter().map(ApiAlert::from).collect()
    } else {
        let client = DashboardClient::from_env();
        info!("Loading alerts from {}", client.base_url());
        client
            .get_alerts(sport_param(&filters), filters.alert_type.query_value(), limit)
            .await
            .alerts
    };

    let shown = filters.apply(&alerts);

    header("ALERTAS");
    println!("{}", render_stat_cards(&DashboardStats::from_alerts(&shown)));
    println!();
    println!("{}", render_table(&shown));

    let active = filters.active_filters_count();
    if active > 0 {
        println!("\n{}", format!("{} filtro(s) activo(s)", active).yellow());
    }
    Ok(())
}

async fn show_stats(config: &Config) -> Result<()> {
    let db = Database::new(&config.database_path).await?;
    let stats = db.alert_stats().await?;
    let sports = db.sport_counts().await?;

    header("ESTADISTICAS");
    println!("  Total alertas:  {}", stats.total.to_string().bold());
    println!("  EV+:            {}", stats.ev.to_string().green());
    println!("  Anomalias:      {}", stats.anomalies.to_string().yellow());
    println!("  Enviadas:       {}", stats.sent.to_string().cyan());
    if let Some(last) = stats.last_created {
        println!("  Ultima alerta:  {}", last.format("%Y-%m-%d %H:%M UTC"));
    }

    if !sports.is_empty() {
        println!("\n{}", "-".repeat(70));
        for (sport, count) in sports {
            println!("  {:<12} {:>6}", sport, count);
        }
    }
    Ok(())
}

async fn analyze(config: &Config, home: &str, away: &str, league: &str) -> Result<()> {
    let db = Arc::new(Database::new(&config.database_path).await?);
    let engine = RobustStatsEngine::new(Some(db));
    let analysis = engine.comprehensive_analysis(home, away, league).await;

    header(&format!("{} vs {} ({})", home, away, league));
    println!("{}", format_analysis_summary(&analysis));
    Ok(())
}

fn tennis(player1: &str, player2: &str, elo1: f64, elo2: f64, surface: &str, league: &str) {
    let analysis = analyze_tennis_match(player1, player2, elo1, elo2, surface, best_of(league));

    header(&format!("{} vs {}", player1, player2));
    println!("  Superficie: {}  |  {}", analysis.surface, analysis.format);
    println!(
        "  {:<24} Elo {:>6.0}  prob {:>5.1}%  cuota justa {:.2}",
        analysis.player1,
        analysis.elo_player1,
        analysis.prob_player1_win * 100.0,
        analysis.fair_odds_player1
    );
    println!(
        "  {:<24} Elo {:>6.0}  prob {:>5.1}%  cuota justa {:.2}",
        analysis.player2,
        analysis.elo_player2,
        analysis.prob_player2_win * 100.0,
        analysis.fair_odds_player2
    );
    println!(
        "  Juegos esperados: {:.1} (sd {:.1})",
        analysis.expected_games, analysis.games_std_dev
    );
}

async fn add_result(config: &Config, game: &GameResult) -> Result<()> {
    let db = Database::new(&config.database_path).await?;
    let id = db.record_game_result(game).await?;
    println!(
        "{} #{} {} {}-{} {} ({})",
        "Saved".green().bold(),
        id,
        game.home_team,
        game.home_score,
        game.away_score,
        game.away_team,
        game.league
    );
    Ok(())
}
