use clap::{Parser, Subcommand};
use finishit_core::Config;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "finishit", version, about = "Finish-It focus timer")]
pub struct Cli {
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log state transitions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Run(commands::session::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Show the rank ladder
    Ranks,
    /// List breathing techniques
    Techniques,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(config: &Config, quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("FINISHIT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so JSON output on stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config, cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::session::run(args, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Ranks => commands::catalog::ranks(),
        Commands::Techniques => commands::catalog::techniques(),
        Commands::Completions { shell } => commands::catalog::completions(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
