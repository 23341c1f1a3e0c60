//! OWS security proxy command-line front end.
//!
//! Runs the proxy's document and request transformations against local
//! files: capabilities mapping and camouflage, spatial securing of WFS
//! requests, request classification and EPSG axis-order lookups.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ows-cli")]
#[command(about = "Inspect and transform OGC web service documents")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map a capabilities document to its record tree (JSON)
    Parse {
        /// Capabilities document
        file: PathBuf,
    },

    /// Rewrite the endpoints of a capabilities document to the proxy
    Camouflage {
        /// Capabilities document
        file: PathBuf,

        /// Public URL of the proxy
        #[arg(long, env = "PROXY_BASE_URL")]
        proxy_base: String,

        /// Layer or feature type identifiers to hide (comma separated)
        #[arg(long, value_delimiter = ',')]
        hide: Vec<String>,

        /// Redis URL for the document cache (in-memory when unset)
        #[arg(long, env = "REDIS_URL")]
        redis_url: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restrict a WFS GetFeature or Transaction body to an allowed area
    Secure {
        /// WFS request body
        file: PathBuf,

        /// GeoJSON file holding the allowed area
        #[arg(long)]
        area: PathBuf,

        /// SRID of the allowed area
        #[arg(long)]
        srid: Option<u32>,

        /// Geometry property the filter applies to
        #[arg(long, default_value = "geometry")]
        value_reference: String,

        /// Reorder the area's coordinates to the EPSG axis order of its SRID
        #[arg(long)]
        adjust_axis_order: bool,

        /// EPSG API base URL
        #[arg(long, env = "EPSG_API_URL")]
        epsg_api_url: Option<String>,

        /// Redis URL for the axis-order cache (in-memory when unset)
        #[arg(long, env = "REDIS_URL")]
        redis_url: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify an OGC request
    Classify {
        /// Request URI with query string
        uri: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// POST body file
        #[arg(long)]
        body: Option<PathBuf>,
    },

    /// Resolve the axis order of an EPSG code
    AxisOrder {
        srid: u32,

        /// EPSG API base URL
        #[arg(long, env = "EPSG_API_URL")]
        epsg_api_url: Option<String>,

        /// Redis URL for the axis-order cache (in-memory when unset)
        #[arg(long, env = "REDIS_URL")]
        redis_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so command output stays pipeable.
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    match args.command {
        Command::Parse { file } => {
            let xml = commands::read_input(&file)?;
            println!("{}", commands::parse_capabilities(&xml)?);
        }
        Command::Camouflage {
            file,
            proxy_base,
            hide,
            redis_url,
            output,
        } => {
            let xml = commands::read_input(&file)?;
            let cache = commands::build_cache(redis_url.as_deref()).await?;
            let documents = storage::create_document_cache(cache);
            let rendered =
                commands::camouflage_capabilities(&documents, &xml, &proxy_base, &hide).await?;
            commands::write_output(output.as_deref(), &rendered)?;
            info!(proxy_base = %proxy_base, hidden = hide.len(), "Camouflaged capabilities document");
        }
        Command::Secure {
            file,
            area,
            srid,
            value_reference,
            adjust_axis_order,
            epsg_api_url,
            redis_url,
            output,
        } => {
            let xml = commands::read_input(&file)?;
            let area = commands::read_area(&area, srid)?;
            let area = if adjust_axis_order {
                let registry =
                    commands::build_registry(epsg_api_url.as_deref(), redis_url.as_deref()).await?;
                epsg_registry::adjust_axis_order(&registry, &area).await
            } else {
                area
            };
            let (secured, changed) = commands::secure_request(&xml, &value_reference, &area)?;
            commands::write_output(output.as_deref(), &secured)?;
            info!(changed = changed, "Secured WFS request");
        }
        Command::Classify { uri, method, body } => {
            let body = body.map(|path| commands::read_input(&path)).transpose()?;
            let summary = commands::classify(&method, &uri, body.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::AxisOrder {
            srid,
            epsg_api_url,
            redis_url,
        } => {
            let registry =
                commands::build_registry(epsg_api_url.as_deref(), redis_url.as_deref()).await?;
            let summary = commands::axis_order(&registry, srid).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
