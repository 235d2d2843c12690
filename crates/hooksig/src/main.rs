use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use hooksig::{server, sign_payload, verify_payload, RootConfig, RootError, RootResult};
use hooksig_core::SchemeRegistry;
use hooksig_http::{EVENT_NAME_HEADER, SIGNATURE_HEADER};

/// hooksig: replay-resistant webhook signatures
///
/// Signs payloads with every configured secret and scheme, and verifies
/// them with timestamp tolerance and scheme trust policy.
#[derive(Parser, Debug)]
#[command(name = "hooksig", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign a payload and print the Do-Signature header value
    ///
    /// With --event, prints both headers as `Name: value` lines.
    Sign {
        /// Signing secret (repeatable); defaults to [signing].secrets
        #[arg(short, long = "secret")]
        secrets: Vec<String>,

        /// Unix timestamp to sign at; defaults to now
        #[arg(short, long)]
        timestamp: Option<i64>,

        /// Payload file; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Event name, prefixed with [signing].event_namespace
        #[arg(short, long)]
        event: Option<String>,
    },

    /// Verify a Do-Signature header value against a payload
    Verify {
        /// The Do-Signature header value
        #[arg(long)]
        header: String,

        /// Accepted secret (repeatable); defaults to [verification].secrets
        #[arg(short, long = "secret")]
        secrets: Vec<String>,

        /// Payload file; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum signature age in seconds
        #[arg(long)]
        tolerance: Option<u64>,

        /// Skip the signature age check
        #[arg(long)]
        ignore_tolerance: bool,

        /// Scheme version to ignore (repeatable)
        #[arg(long = "untrusted")]
        untrusted: Vec<i64>,
    },

    /// List registered signature schemes
    Schemes,

    /// Run the webhook receiver
    Serve {
        /// Bind address; defaults to [server].bind
        #[arg(long)]
        bind: Option<String>,

        /// Port; defaults to [server].port
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("hooksig=debug,hooksig_core=debug,hooksig_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hooksig=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> RootResult<RootConfig> {
    match path {
        Some(p) => RootConfig::load(p),
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)
        }
    }
}

fn read_payload(file: Option<&PathBuf>) -> RootResult<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> RootResult<()> {
    match cli.command {
        Commands::Sign {
            secrets,
            timestamp,
            file,
            event,
        } => cmd_sign(
            cli.config.as_ref(),
            secrets,
            timestamp,
            file.as_ref(),
            event.as_deref(),
        ),
        Commands::Verify {
            header,
            secrets,
            file,
            tolerance,
            ignore_tolerance,
            untrusted,
        } => cmd_verify(
            cli.config.as_ref(),
            &header,
            secrets,
            file.as_ref(),
            tolerance,
            ignore_tolerance,
            untrusted,
        ),
        Commands::Schemes => cmd_schemes(),
        Commands::Serve { bind, port } => cmd_serve(cli.config.as_ref(), bind, port).await,
    }
}

fn cmd_sign(
    config_path: Option<&PathBuf>,
    secrets: Vec<String>,
    timestamp: Option<i64>,
    file: Option<&PathBuf>,
    event: Option<&str>,
) -> RootResult<()> {
    let config = load_config(config_path)?;
    let event = event.map(|name| config.signing.event_name(name));
    let secrets = if secrets.is_empty() {
        config.signing.secrets
    } else {
        secrets
    };

    let t = match timestamp {
        Some(ts) => DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| RootError::Config(format!("timestamp {} out of range", ts)))?,
        None => Utc::now(),
    };

    let payload = read_payload(file)?;
    let header = sign_payload(SchemeRegistry::builtin(), t, &payload, &secrets)?;
    match event {
        Some(event) => {
            println!("{}: {}", EVENT_NAME_HEADER, event);
            println!("{}: {}", SIGNATURE_HEADER, header);
        }
        None => println!("{}", header),
    }
    Ok(())
}

fn cmd_verify(
    config_path: Option<&PathBuf>,
    header: &str,
    secrets: Vec<String>,
    file: Option<&PathBuf>,
    tolerance: Option<u64>,
    ignore_tolerance: bool,
    untrusted: Vec<i64>,
) -> RootResult<()> {
    let config = load_config(config_path)?;
    let secrets = if secrets.is_empty() {
        config.verification.secrets.clone()
    } else {
        secrets
    };

    let mut opts = config.verification.options();
    if let Some(secs) = tolerance {
        opts = opts.with_tolerance(Duration::from_secs(secs));
    }
    if ignore_tolerance {
        opts = opts.ignore_tolerance();
    }
    for version in untrusted {
        opts = opts.untrust_version(version);
    }

    let payload = read_payload(file)?;
    verify_payload(SchemeRegistry::builtin(), header, &payload, &secrets, &opts)?;
    println!("verified");
    Ok(())
}

fn cmd_schemes() -> RootResult<()> {
    let registry = SchemeRegistry::builtin();
    let current = registry.current().map(|s| s.version());

    println!("Signature schemes ({}):", registry.len());
    for scheme in registry.all() {
        let marker = if Some(scheme.version()) == current {
            " (current)"
        } else {
            ""
        };
        println!("  v{}{}", scheme.version(), marker);
    }
    Ok(())
}

async fn cmd_serve(
    config_path: Option<&PathBuf>,
    bind: Option<String>,
    port: Option<u16>,
) -> RootResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(b) = bind {
        config.server.bind = b;
    }
    if let Some(p) = port {
        config.server.port = p;
    }
    if config.verification.secrets.is_empty() {
        return Err(RootError::Config(
            "[verification].secrets is empty; every webhook would be rejected".into(),
        ));
    }

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "webhook receiver listening");

    let router = server::build_router(&config);
    axum::serve(listener, router).await?;
    Ok(())
}
