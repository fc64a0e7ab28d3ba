use anyhow::Result;
use clap::{Parser, Subcommand};

use simulotto::cli::{
    handle_audit_command, handle_bet_command, handle_draw_command, handle_game_command,
    handle_user_command,
};
use simulotto::config::{Settings, SimulottoPaths};
use simulotto::storage::{provision, Storage};

#[derive(Parser)]
#[command(
    name = "simulotto",
    version,
    about = "Lottery simulator with a tamper-evident audit trail",
    long_about = "Simulotto manages users, games, draws and bets. Every change to \
                  games, draws and bets is captured as an immutable, hash-verified \
                  record in a separate append-only audit store."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the domain tables, apply the audit schema and install capture hooks
    Provision,

    /// User management commands
    #[command(subcommand)]
    User(simulotto::cli::UserCommands),

    /// Game type commands
    #[command(subcommand)]
    Game(simulotto::cli::GameCommands),

    /// Draw commands
    #[command(subcommand)]
    Draw(simulotto::cli::DrawCommands),

    /// Bet commands
    #[command(subcommand)]
    Bet(simulotto::cli::BetCommands),

    /// Query and verify the audit trail
    #[command(subcommand)]
    Audit(simulotto::cli::AuditCommands),

    /// Show current configuration and paths
    Config,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "simulotto=debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("SIMULOTTO_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    // Initialize paths and settings
    let paths = SimulottoPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("Simulotto - lottery simulator with an audit trail");
        println!();
        println!("Run 'simulotto provision' to set up the stores.");
        println!("Run 'simulotto --help' for usage information.");
        return Ok(());
    };

    if let Commands::Config = command {
        println!("Simulotto Configuration");
        println!("=======================");
        println!("Base directory:   {}", paths.base_dir().display());
        println!("Settings file:    {}", paths.settings_file().display());
        println!("Domain store:     {}", settings.domain_store.data_dir.display());
        println!("Audit store:      {}", settings.audit_store.log_path.display());
        println!("Write timeout:    {} ms", settings.audit_store.write_timeout_ms);
        println!("Monitored tables: {}", settings.monitored_tables.join(", "));
        return Ok(());
    }

    let storage = Storage::open(settings.clone())?;

    match command {
        Commands::Provision => {
            settings.save(&paths)?;
            let report = provision(&storage)?;
            println!("Provisioning complete.");
            println!("  Domain tables reset");
            println!(
                "  Audit schema v{} ({} existing record(s) kept)",
                report.schema.schema_version, report.preserved_records
            );
            println!("  Capture hooks on: {}", report.hooked_tables.join(", "));
        }
        Commands::User(cmd) => handle_user_command(&storage, cmd)?,
        Commands::Game(cmd) => handle_game_command(&storage, cmd)?,
        Commands::Draw(cmd) => handle_draw_command(&storage, cmd)?,
        Commands::Bet(cmd) => handle_bet_command(&storage, cmd)?,
        Commands::Audit(cmd) => handle_audit_command(&storage, cmd)?,
        Commands::Config => {}
    }

    storage.close()?;
    Ok(())
}
