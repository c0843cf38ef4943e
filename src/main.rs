use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cosmos_collections::azure::accounts::DatabaseAccount;
use cosmos_collections::azure::cloud::CloudEnvironment;
use cosmos_collections::azure::http::format_azure_error;
use cosmos_collections::config::Config;
use cosmos_collections::resource::{
    get_mongo_collection, list_all_mongo_collections, list_mongo_collections,
    mongo_collection_table, ChannelSink, LookupKey, LookupOptions, Row, DEFAULT_CONCURRENCY,
};
use cosmos_collections::VERSION;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Query Azure Cosmos DB Mongo API collections as table rows
#[derive(Parser, Debug)]
#[command(name = "cosmos-collections", version, about, long_about = None)]
struct Args {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Azure cloud environment (AzurePublicCloud, AzureChinaCloud, AzureUSGovernmentCloud)
    #[arg(short, long, global = true)]
    environment: Option<CloudEnvironment>,

    /// Output format for rows
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the table's columns
    Columns,

    /// List the collections of a database, under one account or all of them
    List {
        /// Database whose collections are listed
        #[arg(short, long)]
        database: String,

        /// Restrict to one account (requires --resource-group)
        #[arg(short, long, requires = "resource_group")]
        account: Option<String>,

        /// Resource group of the account (requires --account)
        #[arg(short, long, requires = "account")]
        resource_group: Option<String>,

        /// Region of the account
        #[arg(long, default_value = "")]
        region: String,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<u64>,

        /// Accounts listed at the same time when no account is given
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Look up one collection by its full key
    Get {
        #[arg(short, long)]
        account: String,

        #[arg(short, long)]
        resource_group: String,

        #[arg(short, long)]
        database: String,

        /// Collection name
        #[arg(short, long)]
        name: String,

        /// Report not-found as an error instead of an empty result
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON object per line
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cosmos-collections {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cosmos-collections").join("cosmos-collections.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cosmos-collections").join("cosmos-collections.log");
    }
    PathBuf::from("cosmos-collections.log")
}

fn print_rows<T: Serialize>(rows: &[T], format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            for row in rows {
                serde_json::to_writer(&mut out, row)?;
                writeln!(out)?;
            }
        },
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut out, rows)?;
        },
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let output = args.output;
    let mut config = Config::load();
    config.apply_cli(args.subscription.clone(), args.environment);

    match args.command {
        Command::Columns => print_rows(&mongo_collection_table().describe(), output),
        Command::List {
            database,
            account,
            resource_group,
            region,
            limit,
            concurrency,
        } => {
            let (sink, mut rx) = ChannelSink::new(limit);

            let printer = tokio::spawn(async move {
                let mut rows: Vec<Row> = Vec::new();
                while let Some(row) = rx.recv().await {
                    match output {
                        OutputFormat::Json => print_rows(std::slice::from_ref(&row), output)?,
                        OutputFormat::Yaml => rows.push(row),
                    }
                }
                if !rows.is_empty() {
                    print_rows(&rows, output)?;
                }
                anyhow::Ok(())
            });

            let listed = match (account, resource_group) {
                (Some(account), Some(resource_group)) => {
                    let parent = DatabaseAccount::new(&account, &resource_group, &region);
                    list_mongo_collections(&config, &parent, &database, &sink).await
                },
                _ => list_all_mongo_collections(&config, &database, &sink, concurrency).await,
            };

            // Closing the sender lets the printer drain and finish
            drop(sink);
            printer.await??;
            listed
        },
        Command::Get {
            account,
            resource_group,
            database,
            name,
            strict,
        } => {
            let key = LookupKey::new(&account, &resource_group, &database, &name);
            let mut options = LookupOptions::from(&config);
            if strict {
                options.ignore_not_found = false;
            }

            match get_mongo_collection(&config, &key, options).await? {
                Some(row) => print_rows(&[row], output),
                None => {
                    eprintln!("No collection matched.");
                    Ok(())
                },
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to open log file: {}", e);
            None
        },
    };

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {}", format_azure_error(&e));
        std::process::exit(1);
    }
}
