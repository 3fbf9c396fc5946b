/*!
 * dcor CLI - inspect datasets on a DCOR server
 */

use clap::{Parser, Subcommand, ValueEnum};
use dcor::{
    config::{ClientConfig, LogLevel},
    dataset::{EventSource, FeatureValue, RemoteDataset},
    definitions::{self, TRACE},
    error::{DcorError, Result, EXIT_SUCCESS},
    logging,
};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dcor")]
#[command(version, about = "Lazy access to RT-DC datasets on a DCOR server", long_about = None)]
struct Cli {
    /// Host for bare resource identifiers
    #[arg(long, global = true)]
    host: Option<String>,

    /// Use plain http instead of https
    #[arg(long = "no-ssl", global = true)]
    no_ssl: bool,

    /// API key for private datasets
    #[arg(long = "api-key", value_name = "KEY", global = true)]
    api_key: Option<String>,

    /// Client settings file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (0 = none)
    #[arg(long, value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Log file path (JSON lines)
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show endpoint, title, size, identity hash and features
    Info {
        /// Resource identifier, host/path or URL
        locator: String,
    },

    /// List the features available in a dataset
    Features {
        /// Resource identifier, host/path or URL
        locator: String,
    },

    /// Print a scalar feature or one event of a feature as JSON
    Get {
        /// Resource identifier, host/path or URL
        locator: String,

        /// Feature name
        feature: String,

        /// Event index
        #[arg(short, long)]
        event: Option<usize>,

        /// Trace channel (for the `trace` feature)
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// List the trace channels of a dataset
    Traces {
        /// Resource identifier, host/path or URL
        locator: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = client_config(&cli)?;

    if let Err(e) = logging::init_logging(&client) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Info { locator } => show_info(&RemoteDataset::open(&locator, &client)?),
        Commands::Features { locator } => {
            list_features(&RemoteDataset::open(&locator, &client)?);
            Ok(())
        }
        Commands::Get {
            locator,
            feature,
            event,
            channel,
        } => {
            let ds = RemoteDataset::open(&locator, &client)?;
            let value = fetch(&ds, &feature, event, channel.as_deref())?;
            println!("{}", value);
            Ok(())
        }
        Commands::Traces { locator } => {
            let ds = RemoteDataset::open(&locator, &client)?;
            let traces = ds.get(TRACE)?.into_traces().ok_or_else(|| {
                DcorError::Config("Feature 'trace' is not a trace directory".to_string())
            })?;
            for channel in traces.keys() {
                println!("{}", channel);
            }
            Ok(())
        }
    }
}

/// Settings file (if any) overridden by command line options
fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut client = match cli.config {
        Some(ref path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    if let Some(ref host) = cli.host {
        client.host = host.clone();
    }
    if cli.no_ssl {
        client.use_ssl = false;
    }
    if let Some(ref key) = cli.api_key {
        client.api_key = key.clone();
    }
    if let Some(timeout) = cli.timeout {
        client.timeout_secs = timeout;
    }
    if let Some(level) = cli.log_level {
        client.log_level = level.into();
    }
    if cli.log.is_some() {
        client.log_file = cli.log.clone();
    }
    client.verbose |= cli.verbose;

    Ok(client)
}

fn show_info(ds: &RemoteDataset) -> Result<()> {
    println!("Endpoint: {}", ds.path());
    println!("Title:    {}", ds.title());
    println!("Events:   {}", ds.len());
    println!("Hash:     {}", ds.hash());
    println!("Features: {}", ds.features().keys().join(", "));
    if ds.config().contains("setup", "medium") {
        println!("Medium:   {}", ds.config().get_str("setup", "medium")?);
    }
    Ok(())
}

fn list_features(ds: &RemoteDataset) {
    for name in ds.features().iter() {
        let kind = if definitions::is_scalar(name) {
            "scalar"
        } else {
            "event-wise"
        };
        let label = definitions::feature_label(name).unwrap_or("");
        println!("{:<16} {:<10} {}", name, kind, label);
    }
}

fn fetch(
    ds: &RemoteDataset,
    feature: &str,
    event: Option<usize>,
    channel: Option<&str>,
) -> Result<Value> {
    let require_event = || {
        event.ok_or_else(|| {
            DcorError::Config(format!("Feature '{}' is event-wise, pass --event", feature))
        })
    };

    match ds.get(feature)? {
        FeatureValue::Scalar(column) => match event {
            Some(index) => column.get(index).map(|&x| Value::from(x)).ok_or_else(|| {
                DcorError::Config(format!(
                    "Event {} out of range (dataset has {} events)",
                    index,
                    column.len()
                ))
            }),
            None => Ok(column.iter().map(|&x| Value::from(x)).collect()),
        },
        FeatureValue::Events(events) => Ok(events.get(require_event()?)?.to_json()),
        FeatureValue::Traces(traces) => {
            let channel = channel.ok_or_else(|| {
                let names = traces.keys().join(", ");
                DcorError::Config(format!("Pass --channel, one of: {}", names))
            })?;
            let trace = traces.get(channel)?;
            Ok(trace.get(require_event()?)?.to_json())
        }
    }
}
