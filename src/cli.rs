//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store;
use crate::domain::analysis::{analyze_by_strategy, analyze_by_underlying, GroupStats};
use crate::domain::equity::{build_equity_curve, monthly_pnl};
use crate::domain::error::JournalError;
use crate::domain::metrics::PortfolioMetrics;
use crate::domain::pnl;
use crate::domain::settings::{parse_base_capital, BASE_CAPITAL_KEY};
use crate::domain::trade::{TradeInput, TradeStatus};
use crate::ports::config_port::ConfigPort;
use crate::ports::settings_port::SettingsPort;
use crate::ports::trade_port::TradePort;
use crate::ports::JournalStore;

#[derive(Parser, Debug)]
#[command(name = "optjournal", about = "Options trading journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show portfolio metrics, the equity curve, and monthly P&L
    Dashboard {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List trades, optionally filtered by status
    Positions {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        status: Option<String>,
    },
    /// Record a new trade
    Add {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        underlying: String,
        #[arg(long)]
        strategy: String,
        /// Defaults to today (YYYY-MM-DD)
        #[arg(long)]
        open_date: Option<String>,
        #[arg(long)]
        expiration: Option<String>,
        #[arg(long)]
        contracts: Option<String>,
        #[arg(long)]
        short_strike: Option<String>,
        #[arg(long)]
        long_strike: Option<String>,
        #[arg(long)]
        short_call_strike: Option<String>,
        #[arg(long)]
        long_call_strike: Option<String>,
        #[arg(long)]
        premium_received: Option<String>,
        #[arg(long)]
        premium_paid: Option<String>,
        #[arg(long)]
        commission: Option<String>,
        #[arg(long)]
        collateral: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Close an open trade and realize its P&L
    Close {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
        #[arg(long)]
        close_price: Option<String>,
        /// Defaults to today (YYYY-MM-DD)
        #[arg(long)]
        close_date: Option<String>,
        /// Mark the trade expired instead of closed
        #[arg(long)]
        expired: bool,
    },
    /// Update the mark price on a trade
    Mark {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
        current_price: String,
    },
    /// Delete a trade
    Delete {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
    },
    /// Breakdowns by underlying and by strategy
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Set the base capital used for return calculations
    SetCapital {
        #[arg(short, long)]
        config: PathBuf,
        amount: String,
    },
    /// Export all trades to a JSON file
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Import trades from a JSON file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Dashboard { config } => run_command(&config, cmd_dashboard),
        Command::Positions { config, status } => {
            run_command(&config, |store| cmd_positions(store, status.as_deref()))
        }
        Command::Add {
            config,
            underlying,
            strategy,
            open_date,
            expiration,
            contracts,
            short_strike,
            long_strike,
            short_call_strike,
            long_call_strike,
            premium_received,
            premium_paid,
            commission,
            collateral,
            notes,
            tags,
        } => {
            let input = TradeInput {
                underlying: Some(underlying),
                strategy: Some(strategy),
                status: None,
                open_date: Some(open_date.unwrap_or_else(today)),
                expiration_date: expiration,
                close_date: None,
                contracts,
                short_strike,
                long_strike,
                short_call_strike,
                long_call_strike,
                premium_received,
                premium_paid,
                commission,
                close_price: None,
                current_price: None,
                collateral,
                notes,
                tags,
            };
            run_command(&config, |store| cmd_add(store, &input))
        }
        Command::Close {
            config,
            id,
            close_price,
            close_date,
            expired,
        } => run_command(&config, |store| {
            cmd_close(store, &id, close_price.as_deref(), close_date, expired)
        }),
        Command::Mark {
            config,
            id,
            current_price,
        } => run_command(&config, |store| cmd_mark(store, &id, &current_price)),
        Command::Delete { config, id } => run_command(&config, |store| cmd_delete(store, &id)),
        Command::Analyze { config } => run_command(&config, cmd_analyze),
        Command::SetCapital { config, amount } => {
            run_command(&config, |store| cmd_set_capital(store, &amount))
        }
        Command::Export { config, output } => {
            run_command(&config, |store| cmd_export(store, &output))
        }
        Command::Import { config, input } => {
            run_command(&config, |store| cmd_import(store, &input))
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = JournalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Pick the storage backend the way the journal always has: a configured
/// remote connection wins, otherwise fall back to the local database.
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn JournalStore>, JournalError> {
    #[cfg(feature = "postgres")]
    if config.get_string("postgres", "connection_string").is_some()
        || config.get_string("database", "conninfo").is_some()
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        let adapter = PostgresAdapter::from_config(config)?;
        adapter.initialize_schema()?;
        return Ok(Box::new(adapter));
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let adapter = SqliteAdapter::from_config(config)?;
        adapter.initialize_schema()?;
        Ok(Box::new(adapter))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        Err(JournalError::Database {
            reason: "no storage backend available: configure [postgres] or build with the sqlite feature".into(),
        })
    }
}

pub fn resolve_base_capital(store: &dyn JournalStore) -> Result<f64, JournalError> {
    let raw = store.get_setting(BASE_CAPITAL_KEY)?;
    Ok(parse_base_capital(raw.as_deref()))
}

fn run_command(
    config_path: &PathBuf,
    f: impl FnOnce(&dyn JournalStore) -> Result<(), JournalError>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match f(store.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn fmt_profit_factor(pf: f64) -> String {
    if pf.is_infinite() {
        "inf".to_string()
    } else {
        format!("{pf:.2}")
    }
}

fn cmd_dashboard(store: &dyn JournalStore) -> Result<(), JournalError> {
    let trades = store.list_trades()?;
    let base_capital = resolve_base_capital(store)?;
    eprintln!("Loaded {} trades", trades.len());

    let metrics = PortfolioMetrics::compute(&trades, base_capital);

    println!("=== Capital ===");
    println!("Base Capital:      ${:.2}", metrics.base_capital);
    println!("Current Capital:   ${:.2}", metrics.current_capital);
    println!("Collateral In Use: ${:.2}", metrics.total_collateral);
    println!("Available Capital: ${:.2}", metrics.available_capital);

    println!("\n=== Performance ===");
    println!(
        "Trades:            {} total ({} open, {} closed)",
        metrics.total_trades, metrics.open_trades, metrics.closed_trades
    );
    println!(
        "Win Rate:          {:.1}% ({} wins, {} losses)",
        metrics.win_rate, metrics.wins, metrics.losses
    );
    println!(
        "Profit Factor:     {}",
        fmt_profit_factor(metrics.profit_factor)
    );
    println!("Avg Win:           ${:.2}", metrics.avg_win);
    println!("Avg Loss:          ${:.2}", metrics.avg_loss);
    println!("Realized P&L:      ${:+.2}", metrics.total_realized_pnl);
    println!("Unrealized P&L:    ${:+.2}", metrics.total_unrealized_pnl);
    println!("Total P&L:         ${:+.2}", metrics.total_pnl);
    println!("Return on Capital: {:+.2}%", metrics.return_on_capital);

    let curve = build_equity_curve(&trades, base_capital);
    println!("\n=== Equity Curve ===");
    for point in &curve {
        let annotation = match (&point.underlying, &point.strategy) {
            (Some(u), Some(s)) => format!("  {u} {s}"),
            _ => String::new(),
        };
        println!(
            "{:<12} {:>12.2} {:>+10.2}{}",
            point.label, point.equity, point.pnl, annotation
        );
    }

    let months = monthly_pnl(&trades);
    if !months.is_empty() {
        println!("\n=== Monthly P&L ===");
        for month in &months {
            println!("{}  {:>+10.2}", month.month, month.pnl);
        }
    }

    Ok(())
}

fn cmd_positions(store: &dyn JournalStore, status: Option<&str>) -> Result<(), JournalError> {
    let filter: Option<TradeStatus> = status.map(str::parse).transpose()?;
    let trades = store.list_trades()?;

    println!(
        "{:<36} {:<6} {:<16} {:<8} {:<10} {:>4} {:>10} {:>10}",
        "id", "symbol", "strategy", "status", "opened", "qty", "max loss", "p&l"
    );

    let mut shown = 0usize;
    for trade in &trades {
        if let Some(wanted) = filter {
            if trade.status != wanted {
                continue;
            }
        }
        // Live mark P&L for open trades, stored realized P&L otherwise.
        let trade_pnl = if trade.is_open() {
            pnl::unrealized_pnl(trade)
        } else {
            trade.realized_pnl
        };
        println!(
            "{:<36} {:<6} {:<16} {:<8} {:<10} {:>4} {:>10.2} {:>+10.2}",
            trade.id,
            trade.underlying,
            trade.strategy.to_string(),
            trade.status.to_string(),
            trade.open_date.format("%Y-%m-%d").to_string(),
            trade.contracts,
            trade.max_loss,
            trade_pnl
        );
        shown += 1;
    }

    eprintln!("{shown} trades");
    Ok(())
}

fn cmd_add(store: &dyn JournalStore, input: &TradeInput) -> Result<(), JournalError> {
    let trade = input.build(Uuid::new_v4().to_string())?;
    store.create_trade(&trade)?;

    eprintln!(
        "Recorded {} {} ({} contract{})",
        trade.underlying,
        trade.strategy,
        trade.contracts,
        if trade.contracts == 1 { "" } else { "s" }
    );
    eprintln!("  id:       {}", trade.id);
    eprintln!("  max loss: ${:.2}", trade.max_loss);
    Ok(())
}

fn cmd_close(
    store: &dyn JournalStore,
    id: &str,
    close_price: Option<&str>,
    close_date: Option<String>,
    expired: bool,
) -> Result<(), JournalError> {
    let mut trade = store
        .get_trade(id)?
        .ok_or_else(|| JournalError::TradeNotFound { id: id.into() })?;

    trade.close_price = crate::domain::trade::num_or_zero(close_price);
    let date_str = close_date.unwrap_or_else(today);
    trade.close_date = Some(
        chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
            JournalError::InvalidField {
                field: "close_date".into(),
                reason: format!("invalid date {date_str:?} (expected YYYY-MM-DD)"),
            }
        })?,
    );
    trade.status = if expired {
        TradeStatus::Expired
    } else {
        TradeStatus::Closed
    };
    trade.recompute_derived();
    store.update_trade(&trade)?;

    eprintln!(
        "{} {} {}: realized P&L ${:+.2}",
        trade.status, trade.underlying, trade.strategy, trade.realized_pnl
    );
    Ok(())
}

fn cmd_mark(store: &dyn JournalStore, id: &str, current_price: &str) -> Result<(), JournalError> {
    let mut trade = store
        .get_trade(id)?
        .ok_or_else(|| JournalError::TradeNotFound { id: id.into() })?;

    trade.current_price = crate::domain::trade::num_or_zero(Some(current_price));
    store.update_trade(&trade)?;

    if trade.is_open() {
        eprintln!(
            "Marked {} at {:.2}: unrealized P&L ${:+.2}",
            trade.underlying,
            trade.current_price,
            pnl::unrealized_pnl(&trade)
        );
    } else {
        eprintln!("Marked {} at {:.2}", trade.underlying, trade.current_price);
    }
    Ok(())
}

fn cmd_delete(store: &dyn JournalStore, id: &str) -> Result<(), JournalError> {
    store.delete_trade(id)?;
    eprintln!("Deleted trade {id}");
    Ok(())
}

fn print_group_table(title: &str, groups: &[GroupStats]) {
    println!("=== {title} ===");
    println!(
        "{:<18} {:>6} {:>6} {:>6} {:>9} {:>12}",
        "", "trades", "wins", "losses", "win rate", "total p&l"
    );
    for group in groups {
        println!(
            "{:<18} {:>6} {:>6} {:>6} {:>8.1}% {:>+12.2}",
            group.key, group.count, group.wins, group.losses, group.win_rate, group.total_pnl
        );
    }
}

fn cmd_analyze(store: &dyn JournalStore) -> Result<(), JournalError> {
    let trades = store.list_trades()?;
    eprintln!("Loaded {} trades", trades.len());

    print_group_table("By Underlying", &analyze_by_underlying(&trades));
    println!();
    print_group_table("By Strategy", &analyze_by_strategy(&trades));
    Ok(())
}

fn cmd_set_capital(store: &dyn JournalStore, amount: &str) -> Result<(), JournalError> {
    let value: f64 = amount
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| JournalError::InvalidField {
            field: "base_capital".into(),
            reason: format!("not a number: {amount:?}"),
        })?;

    store.set_setting(BASE_CAPITAL_KEY, &value.to_string())?;
    eprintln!("Base capital set to ${value:.2}");
    Ok(())
}

fn cmd_export(store: &dyn JournalStore, output: &PathBuf) -> Result<(), JournalError> {
    let trades = store.list_trades()?;
    json_store::export_trades(&trades, output)?;
    eprintln!("Exported {} trades to {}", trades.len(), output.display());
    Ok(())
}

fn cmd_import(store: &dyn JournalStore, input: &PathBuf) -> Result<(), JournalError> {
    let trades = json_store::import_trades(input)?;

    let mut created = 0usize;
    let mut skipped = 0usize;
    for mut trade in trades {
        if trade.id.is_empty() {
            trade.id = Uuid::new_v4().to_string();
        }
        if store.get_trade(&trade.id)?.is_some() {
            eprintln!("warning: skipping existing trade {}", trade.id);
            skipped += 1;
            continue;
        }
        store.create_trade(&trade)?;
        created += 1;
    }

    eprintln!("Imported {created} trades ({skipped} skipped)");
    Ok(())
}
