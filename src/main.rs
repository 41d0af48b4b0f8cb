// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use equieat::{
    import_households, AppConfig, AuditAction, Inventory, ReliefSession, VERSION,
};

const USAGE: &str = "Usage:
  equieat run <households.csv> <supplies.csv> [--config <file>]
  equieat summary <households.csv> [--config <file>]
  equieat ui [households.csv] [supplies.csv] [--config <file>]";

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = take_flag(&mut args, "--config")?;
    let config = AppConfig::load(config_path.as_deref())?;

    // Info-level lines on stderr would scribble over the terminal UI
    let command = args.first().map(String::as_str);
    if matches!(command, None | Some("ui")) {
        equieat::logging::init("warn");
    } else {
        equieat::logging::init(&config.log_filter);
    }

    match command {
        Some("run") => run_distribution(&config, &args[1..]),
        Some("summary") => run_summary(&config, &args[1..]),
        Some("ui") => run_ui_mode(&config, &args[1..]),
        Some("help") | Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        // UI mode (default)
        None => run_ui_mode(&config, &[]),
        Some(other) => bail!("Unknown command '{}'\n{}", other, USAGE),
    }
}

/// Remove `flag <value>` from the argument list
fn take_flag(args: &mut Vec<String>, flag: &str) -> Result<Option<PathBuf>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{} needs a value", flag);
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(PathBuf::from(value)))
}

fn load_session(config: &AppConfig, households: Option<&String>, supplies: Option<&String>) -> Result<ReliefSession> {
    let mut session = ReliefSession::from_config(config);
    session.record(AuditAction::SystemStartup, &format!("EquiEat {} started", VERSION));

    if let Some(path) = households {
        let path = Path::new(path);
        println!("\n📂 Loading households...");
        let outcome = import_households(path)
            .with_context(|| format!("Failed to import households from {}", path.display()))?;
        println!("✓ {}", outcome.summary());
        session.load_households(outcome, &path.display().to_string());
    }

    if let Some(path) = supplies {
        let path = Path::new(path);
        println!("\n📦 Loading inventory...");
        let inventory = Inventory::load_csv(path)
            .with_context(|| format!("Failed to load inventory from {}", path.display()))?;
        println!("✓ {} supply lines ({} units)", inventory.len(), inventory.total_units());
        session.load_inventory(inventory, &path.display().to_string());
    }

    Ok(session)
}

fn run_distribution(config: &AppConfig, args: &[String]) -> Result<()> {
    let (Some(households), Some(supplies)) = (args.first(), args.get(1)) else {
        bail!("run needs a households file and a supplies file\n{}", USAGE);
    };

    println!("⚖️  EquiEat - Fair Relief Distribution");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut session = load_session(config, Some(households), Some(supplies))?;

    println!("\n🔄 Running distribution...");
    let run = session.run_distribution()?;
    println!(
        "✓ Distributed {} units, {} units held in reserve",
        run.allocation.total_distributed(),
        run.allocation.total_leftover()
    );
    println!("\n{}", run.summary);

    let reserve = session.reserve_lines();
    if !reserve.is_empty() {
        println!("📋 Reserve & Excess Stock:");
        for line in &reserve {
            println!(
                "   {:<20} {:<18} {:>6}  {}",
                line.name,
                line.category.as_str(),
                line.quantity,
                line.status
            );
        }
    }

    println!("\n💾 Exporting reports...");
    let paths = session.export(config)?;
    println!("✓ {}", paths.packing_list.display());
    println!("✓ {}", paths.reserve_report.display());
    println!("✓ {}", paths.claim_stubs.display());

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Distribution complete!");
    Ok(())
}

fn run_summary(config: &AppConfig, args: &[String]) -> Result<()> {
    let Some(households) = args.first() else {
        bail!("summary needs a households file\n{}", USAGE);
    };

    let session = load_session(config, Some(households), None)?;
    println!("\n{}", session.summary());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, args: &[String]) -> Result<()> {
    println!("🖥️  Loading EquiEat UI...\n");

    let session = load_session(config, args.first(), args.get(1))?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(session, config.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _args: &[String]) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin equieat-server --features server");
    std::process::exit(1);
}
