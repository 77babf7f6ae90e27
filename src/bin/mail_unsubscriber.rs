use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use mail_unsubscriber::auth::token_manager::TokenManager;
use mail_unsubscriber::auth::{AccessTokenSource, StaticToken, token_store};
use mail_unsubscriber::config::{DEFAULT_LOG_PATH, config_for_run, load_config};
use mail_unsubscriber::gmail::client::GmailClient;
use mail_unsubscriber::gmail::{MailProvider, ReadOnly};
use mail_unsubscriber::logging;
use mail_unsubscriber::pipeline::{FailurePolicy, Pipeline, ProcessedSenders};
use mail_unsubscriber::report::{Summary, write_csv};
use mail_unsubscriber::unsubscribe::{DryRunUnsubscriber, HttpUnsubscriber};

#[derive(Parser)]
#[command(name = "mail_unsubscriber")]
#[command(about = "Bulk-unsubscribe from promotional mail in a Gmail mailbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the mailbox, unsubscribe from senders and write the CSV report
    Run(RunArgs),

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Gmail search query (defaults to the configured one)
    #[arg(long)]
    query: Option<String>,

    /// CSV report path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log file path (lines also go to stdout)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Only process this many messages from the search
    #[arg(long)]
    max_messages: Option<usize>,

    /// Add a `Failed` row when an unsubscribe request fails
    #[arg(long)]
    record_failures: bool,

    /// Find unsubscribe links but do not fetch them or mark mail read
    #[arg(long)]
    dry_run: bool,

    /// Use this bearer token instead of the stored OAuth credentials
    #[arg(long, env = "GMAIL_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {client_id}");
            Ok(())
        }

        Command::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let loaded = load_config();

    // Logging comes up first so config problems land in the log file too.
    let log_path = args.log_file.clone().unwrap_or_else(|| {
        loaded
            .as_ref()
            .map_or_else(|_| PathBuf::from(DEFAULT_LOG_PATH), |c| c.log_path.clone())
    });
    logging::init(&log_path)?;

    let cfg = config_for_run(loaded, args.access_token.is_some())
        .inspect_err(|e| error!("{e}"))?;

    let query = args.query.unwrap_or_else(|| cfg.query.clone());
    let csv_path = args.output.unwrap_or_else(|| cfg.csv_path.clone());
    let max_messages = args.max_messages.or(cfg.max_messages);
    let policy = FailurePolicy::from_record_flag(args.record_failures || cfg.record_failures);

    let tokens: Box<dyn AccessTokenSource> = match args.access_token {
        Some(t) => Box::new(StaticToken(t)),
        None => Box::new(TokenManager::from_config(&cfg)?),
    };
    // Without credentials nothing can run.
    tokens
        .access_token()
        .context("could not obtain Gmail credentials")?;

    let gmail = GmailClient::new(tokens)?.with_max_messages(max_messages);

    let messages = gmail.search(&query).unwrap_or_else(|e| {
        error!("Error searching emails: {e}");
        Vec::new()
    });
    if messages.is_empty() {
        info!("No subscription emails found.");
        return Ok(());
    }
    info!("Found {} emails to process.", messages.len());

    let mut processed = ProcessedSenders::new();
    let results = if args.dry_run {
        Pipeline::new(ReadOnly(&gmail), DryRunUnsubscriber)
            .with_failure_policy(policy)
            .process(&messages, &mut processed)
    } else {
        Pipeline::new(&gmail, HttpUnsubscriber::new()?)
            .with_failure_policy(policy)
            .process(&messages, &mut processed)
    };

    write_csv(&csv_path, &results)
        .with_context(|| format!("writing {}", csv_path.display()))?;
    Summary::from_results(&results).log();
    Ok(())
}
