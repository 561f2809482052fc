mod analyzer;
mod api;
mod cli;
mod config;
mod db;
mod error;
mod games;
mod model;
mod monitor;
mod planner;
mod scheduler;
mod sessions;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::Config;
use crate::db::Database;
use crate::model::ScheduleType;
use crate::planner::advice;
use crate::planner::reminder::LogNotifier;
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use std::future::pending;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Service => run_service(Config::load()?).await,
        Commands::Start => handle_start(),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor().await,
        Commands::Remind => handle_remind(),
        Commands::Stats => handle_stats(),
        Commands::Advise => handle_advise(),
        Commands::System => handle_system().await,
        Commands::Config { command } => handle_config_command(command),
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_start() -> Result<()> {
    let config = Config::load()?;

    if is_port_open(config.api_port) {
        println!(
            "GameTracker is already listening on http://127.0.0.1:{}",
            config.api_port
        );
        return Ok(());
    }

    let current_exe =
        std::env::current_exe().context("Failed to resolve current executable path")?;
    Command::new(current_exe)
        .arg("service")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
        .context("Failed to spawn background service")?;
    thread::sleep(Duration::from_millis(900));

    if !is_port_open(config.api_port) {
        bail!("Failed to start service. Run `GameTracker service` to see the error.");
    }

    println!("GameTracker started on http://127.0.0.1:{}", config.api_port);
    Ok(())
}

fn handle_status() -> Result<()> {
    let config = Config::load()?;
    let database = Database::open(&config.db_path)?;

    println!("GameTracker status");
    println!("- api_listening: {}", is_port_open(config.api_port));
    println!("- api_port: {}", config.api_port);
    println!("- db_path: {}", config.db_path.display());
    println!("- games: {}", database.list_games()?.len());
    println!("- active_sessions: {}", database.active_sessions()?.len());
    let now = now();
    let (overdue, upcoming): (Vec<_>, Vec<_>) = planner::schedules::upcoming_schedules(&database)?
        .into_iter()
        .partition(|schedule| schedule.is_overdue(now));
    println!("- upcoming_schedules: {}", upcoming.len());
    println!("- overdue_schedules: {}", overdue.len());
    println!(
        "- last_session_started_at: {}",
        database
            .latest_session_start()?
            .map(|start| start.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

async fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path();
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!(
            "[WARN] config.json not found, using defaults: {}",
            config_path.display()
        );
        issues.push("config missing");
    }

    let config = Config::load()?;

    match Database::open(&config.db_path) {
        Ok(_) => println!("[OK] SQLite reachable: {}", config.db_path.display()),
        Err(error) => {
            println!("[WARN] SQLite check failed: {error:#}");
            issues.push("db unreachable");
        }
    }

    if is_port_open(config.api_port) {
        println!("[OK] API listening on port {}", config.api_port);
    } else {
        println!("[WARN] nothing listening on port {}", config.api_port);
        issues.push("api not running");
    }

    if config.reminder_notify {
        println!(
            "[OK] reminders enabled every {} minute(s)",
            config.reminder_interval_minutes
        );
    } else {
        println!("[OK] reminders disabled");
    }

    if monitor::sample_metrics().await?.cpu_temperature.is_some() {
        println!("[OK] CPU temperature sensor readable");
    } else {
        println!("[WARN] no CPU temperature sensor reported a reading");
        issues.push("temperature sensor missing");
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn handle_remind() -> Result<()> {
    let config = Config::load()?;
    let count = scheduler::run_once(&config.db_path, &LogNotifier, now())?;

    println!("Reminders sent: {count}");
    Ok(())
}

fn handle_stats() -> Result<()> {
    let config = Config::load()?;
    let database = Database::open(&config.db_path)?;
    let now = now();
    let schedule_stats = advice::schedule_stats(&database, now)?;
    let overall = analyzer::overall_stats(&database, now)?;

    println!("Schedules");
    println!("- completed (7d): {}", schedule_stats.completed_this_week);
    println!("- completed (30d): {}", schedule_stats.completed_this_month);
    println!("- upcoming: {}", schedule_stats.upcoming_count);
    println!("- overdue: {}", schedule_stats.overdue_count);
    ScheduleType::ALL.into_iter().for_each(|kind| {
        let count = schedule_stats
            .type_distribution
            .get(&kind)
            .copied()
            .unwrap_or(0);
        println!("  - {}: {count}", kind.display_name());
    });

    println!("Sessions");
    println!("- sessions (7d): {}", overall.sessions_this_week);
    println!("- sessions (30d): {}", overall.sessions_this_month);
    println!("- playtime (7d): {:.2} h", overall.playtime_this_week_hours);
    println!("- playtime (30d): {:.2} h", overall.playtime_this_month_hours);

    Ok(())
}

fn handle_advise() -> Result<()> {
    let config = Config::load()?;
    let database = Database::open(&config.db_path)?;

    advice::recommendations(&database, now())?
        .iter()
        .for_each(|message| println!("- {message}"));

    Ok(())
}

async fn handle_system() -> Result<()> {
    let metrics = monitor::sample_metrics().await?;
    let info = tokio::task::spawn_blocking(monitor::system_info)
        .await
        .context("System info task failed")?;

    println!("{} {}", info.os_name, info.os_version);
    println!("- cpu: {} ({} cores)", metrics.cpu_name, metrics.cpu_cores);
    println!("- cpu_usage: {}%", metrics.cpu_usage);
    println!(
        "- memory: {}% of {} GB ({} GB available)",
        metrics.memory_usage, metrics.total_memory_gb, metrics.available_memory_gb
    );
    println!(
        "- cpu_temperature: {}",
        metrics
            .cpu_temperature
            .map(|celsius| format!("{celsius}°C"))
            .unwrap_or_else(|| "n/a".to_string())
    );

    monitor::optimization_recommendations(&metrics)
        .into_iter()
        .for_each(|(key, message)| println!("[{key}] {message}"));

    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    let _ = Database::open(&config.db_path)?;

    let shared_config = Arc::new(config);
    let api_config = Arc::clone(&shared_config);
    let reminders_enabled = shared_config.reminder_notify;
    let scheduler_config = (*shared_config).clone();

    info!(
        port = shared_config.api_port,
        reminders_enabled, "GameTracker service started"
    );

    tokio::select! {
        scheduler_result = async move {
            if reminders_enabled {
                scheduler::run_reminder_scheduler(scheduler_config).await
            } else {
                pending().await
            }
        } => {
            scheduler_result?;
        }
        api_result = api::run_server(api_config) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn is_port_open(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(250)).is_ok()
}
