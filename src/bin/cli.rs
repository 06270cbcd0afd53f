//! IKV CLI
//!
//! Command-line interface for provisioning the native binary and issuing
//! lookups against an embedded engine.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use ikv_client::binary::{
    BinaryLifecycleManager, DirectoryRepository, RemoteBinaryRepository, S3Repository,
};
use ikv_client::native::{DynamicLoader, LibraryLoader, NativeEngineHandle};
use ikv_client::{Config, IkvError, PlatformTag, Reader, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// IKV CLI
#[derive(Parser, Debug)]
#[command(name = "ikv-cli")]
#[command(about = "CLI for the embedded IKV engine")]
#[command(version)]
struct Args {
    /// Mount directory (binary lives in {mount_dir}/bin)
    #[arg(short, long, default_value = "./ikv_data")]
    mount_dir: PathBuf,

    /// Bucket holding published binaries
    #[arg(long, default_value = S3Repository::DEFAULT_BUCKET)]
    bucket: String,

    /// Bucket region
    #[arg(long, default_value = S3Repository::DEFAULT_REGION)]
    region: String,

    /// S3-compatible endpoint override
    #[arg(long)]
    endpoint: Option<String>,

    /// Local directory mirroring the bucket (used instead of S3)
    #[arg(long)]
    mirror: Option<PathBuf>,

    /// Store name passed to the engine
    #[arg(long)]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the platform tag of this host
    Platform,

    /// Resolve (and download if needed) the native binary, print its path
    Resolve,

    /// Load a native library and run its health check
    HealthCheck {
        /// Path to the native library
        #[arg(short, long)]
        library: PathBuf,

        /// Probe string
        #[arg(default_value = "ping")]
        probe: String,
    },

    /// Get a field value by primary key
    Get {
        /// The primary key
        key: String,

        /// The field name
        field: String,
    },

    /// Get several fields for several primary keys
    Multiget {
        /// Comma-separated primary keys
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,

        /// Comma-separated field names
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ikv_client=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match &args.command {
        Commands::Platform => {
            match PlatformTag::resolve() {
                Some(tag) => println!("{}", tag),
                None => println!("unsupported"),
            }
            Ok(())
        }
        Commands::Resolve => {
            let manager = BinaryLifecycleManager::new(&args.mount_dir, repository(&args)?);
            let path = manager.resolve_binary_path()?.ok_or(IkvError::NoBinary)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::HealthCheck { library, probe } => {
            let engine = NativeEngineHandle::new(DynamicLoader.load(library)?);
            let healthy = engine.health_check(probe)?;
            println!("{}", if healthy { "OK" } else { "UNHEALTHY" });
            if healthy {
                Ok(())
            } else {
                Err(IkvError::EngineCall("health check failed".to_string()))
            }
        }
        Commands::Get { key, field } => {
            let reader = start_reader(&args)?;
            let value = reader.get_bytes_value(key, field)?;
            print_value(value.as_deref());
            reader.shutdown();
            Ok(())
        }
        Commands::Multiget { keys, fields } => {
            let reader = start_reader(&args)?;
            let no_byte_keys: [&[u8]; 0] = [];
            let values = reader.multiget_bytes_values(&no_byte_keys, keys, fields)?;
            let pairs = keys.iter().flat_map(|k| fields.iter().map(move |f| (k, f)));
            for ((key, field), value) in pairs.zip(values) {
                print!("{}\t{}\t", key, field);
                print_value(value.as_deref());
            }
            reader.shutdown();
            Ok(())
        }
    }
}

fn repository(args: &Args) -> Result<Box<dyn RemoteBinaryRepository>> {
    if let Some(mirror) = &args.mirror {
        return Ok(Box::new(DirectoryRepository::new(mirror)));
    }
    let repo = match &args.endpoint {
        Some(endpoint) => S3Repository::with_endpoint(endpoint.clone())?,
        None => S3Repository::new(&args.bucket, &args.region)?,
    };
    Ok(Box::new(repo))
}

fn start_reader(args: &Args) -> Result<Reader> {
    let mut builder = Config::builder()
        .mount_directory(&args.mount_dir)
        .bucket(&args.bucket)
        .region(&args.region);
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(store) = &args.store {
        builder = builder.store_name(store);
    }
    let config = builder.build()?;

    Reader::startup(config, repository(args)?, &DynamicLoader)
}

fn print_value(value: Option<&[u8]>) {
    match value {
        Some(bytes) => println!("{}", String::from_utf8_lossy(bytes)),
        None => println!("(nil)"),
    }
}
