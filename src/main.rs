use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use ratequote::core::Selection;
use ratequote::core::calculator::{CustomSelection, SwatSelection};
use ratequote::core::currency::LEDGER_CURRENCY;
use ratequote::core::log::init_logging;
use ratequote::{AppCommand, QuoteOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct QuoteArgs {
    /// Display currency, defaults to the configured one
    #[arg(long)]
    currency: Option<String>,

    /// Save the assembled quote
    #[arg(long)]
    save: bool,

    /// Write the assembled quote as JSON to this path
    #[arg(long)]
    export: Option<PathBuf>,
}

impl From<QuoteArgs> for QuoteOptions {
    fn from(args: QuoteArgs) -> Self {
        QuoteOptions {
            currency: args.currency,
            save: args.save,
            export: args.export,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List regions, roles, seniority levels and currencies
    Catalog,
    /// Calculate a custom resource rate
    Custom {
        /// Region id
        #[arg(long)]
        region: Option<String>,
        /// Role id
        #[arg(long)]
        role: Option<String>,
        /// Seniority level id
        #[arg(long)]
        seniority: Option<String>,
        #[command(flatten)]
        quote: QuoteArgs,
    },
    /// Calculate a SWAT team rate
    Swat {
        /// SWAT role id
        #[arg(long)]
        role: Option<String>,
        /// Workload percentage (25, 50, 75, 100)
        #[arg(long)]
        workload: Option<u32>,
        /// Engagement duration in months
        #[arg(long)]
        duration: Option<i32>,
        /// Seniority level id
        #[arg(long)]
        seniority: Option<String>,
        #[command(flatten)]
        quote: QuoteArgs,
    },
    /// Fetch the latest exchange rates
    Refresh {
        /// Base currency for the rate table
        #[arg(long, default_value = LEDGER_CURRENCY)]
        base: String,
    },
    /// List saved quotes
    Quotes,
    /// Validate an email request for an exported quote
    Email {
        /// Recipient email address
        #[arg(long)]
        to: String,
        /// Sender name
        #[arg(long)]
        from: String,
        /// Optional message for the recipient
        #[arg(long)]
        message: Option<String>,
        /// Quote file written with --export
        quote: PathBuf,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Catalog => AppCommand::Catalog,
            Commands::Custom {
                region,
                role,
                seniority,
                quote,
            } => AppCommand::Calculate {
                selection: Selection::Custom(CustomSelection {
                    region,
                    role,
                    seniority,
                }),
                options: quote.into(),
            },
            Commands::Swat {
                role,
                workload,
                duration,
                seniority,
                quote,
            } => AppCommand::Calculate {
                selection: Selection::Swat(SwatSelection {
                    role,
                    workload_percent: workload,
                    duration_months: duration,
                    seniority,
                }),
                options: quote.into(),
            },
            Commands::Refresh { base } => AppCommand::Refresh { base },
            Commands::Quotes => AppCommand::Quotes,
            Commands::Email {
                to,
                from,
                message,
                quote,
            } => AppCommand::Email {
                quote_path: quote,
                recipient: to,
                sender: from,
                message,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ratequote::cli::setup::setup_at_path(path),
            None => ratequote::cli::setup::setup(),
        },
        Some(cmd) => ratequote::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
