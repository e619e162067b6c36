//! `wms`: describe Web Map Services and download map images from them.
//!
//! Request settings can be stored as named profiles in
//! `$HOME/wms-config/.wms.yaml` (or `$WMS_CONFIG`) and reused; flags given
//! on the command line override the stored values.

mod bbox_input;
mod commands;
mod profiles;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use profiles::ProfileStore;

#[derive(Parser, Debug)]
#[command(name = "wms")]
#[command(about = "Generate images via web map services")]
#[command(
    long_about = "This program helps you to generate images via web map services.\n\nConfiguration file: $HOME/wms-config/.wms.yaml"
)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Profile file (default: $HOME/wms-config/.wms.yaml)
    #[arg(long, global = true, env = "WMS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get the capabilities of a WMS
    #[command(alias = "getcap")]
    Cap(CapArgs),
    /// Download one map image per bounding box
    #[command(alias = "getmap")]
    Map(MapArgs),
    /// Show version
    Version,
}

/// Server connection, shared by all commands.
#[derive(Args, Debug, Clone, Default)]
struct ConnectionArgs {
    /// Service URL
    #[arg(short, long, env = "WMS_URL")]
    url: Option<String>,

    /// WMS version (e.g. 1.1.1, 1.3.0)
    #[arg(short, long)]
    version: Option<String>,

    /// User for HTTP basic authentication
    #[arg(long, env = "WMS_USER")]
    user: Option<String>,

    /// Password for HTTP basic authentication
    #[arg(long, env = "WMS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct CapArgs {
    /// Stored profile to read the URL and version from
    profile: Option<String>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// List available formats
    #[arg(short, long)]
    formats: bool,

    /// List available layers
    #[arg(short, long)]
    layers: bool,

    /// List available EPSG codes
    #[arg(short, long)]
    epsg: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Stored profile to start from
    profile: Option<String>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Image format (MIME type)
    #[arg(short, long)]
    format: Option<String>,

    /// Layers, comma separated; `layer/style` selects a style
    #[arg(short, long, value_delimiter = ',')]
    layers: Option<Vec<String>>,

    /// EPSG code of the bounding boxes
    #[arg(short, long)]
    epsg: Option<u32>,

    /// Width of the output image in px
    #[arg(short, long, default_value = "0")]
    width: u32,

    /// Height of the output image in px
    #[arg(short = 'H', long, default_value = "0")]
    height: u32,

    /// Scale denominator (requires --dpi)
    #[arg(short, long, default_value = "0")]
    scale: u32,

    /// Resolution in dots per inch (requires --scale)
    #[arg(short = 'i', long, default_value = "0")]
    dpi: u32,

    /// Bounding box: minx,miny,maxx,maxy
    #[arg(short, long, allow_hyphen_values = true, conflicts_with = "bbox_file")]
    bbox: Option<String>,

    /// File with one bounding box per line
    #[arg(short = 'B', long)]
    bbox_file: Option<PathBuf>,

    /// Expand each bounding box by this percentage
    #[arg(short = 'E', long, default_value = "0")]
    expand: f64,

    /// Cut the image back to the unexpanded bounding box
    #[arg(short = 'C', long)]
    cut: bool,

    /// Base name of the output files
    #[arg(short = 'n', long)]
    file_name: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Maximum concurrent map requests
    #[arg(long, default_value = "8")]
    max_concurrent: usize,

    /// Validate the request without downloading
    #[arg(long)]
    dry_run: bool,

    /// Save the effective settings under this profile name
    #[arg(long)]
    save: Option<String>,
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // stdout is reserved for command output
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => profiles::default_path()?,
    };

    match cli.command {
        Command::Cap(args) => {
            let store = ProfileStore::load(config_path)?;
            commands::cap(args, &store).await
        }
        Command::Map(args) => {
            let mut store = ProfileStore::load(config_path)?;
            commands::map(args, &mut store).await
        }
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_map_flags() {
        let cli = Cli::try_parse_from([
            "wms", "map", "osm", "-u", "http://example.com/wms", "-l", "a/b,c", "-e", "25832",
            "-w", "800", "-H", "600", "-b", "-10,-5,10,5", "-E", "10", "-C", "-n", "bonn",
        ])
        .unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(args.profile.as_deref(), Some("osm"));
        assert_eq!(args.connection.url.as_deref(), Some("http://example.com/wms"));
        assert_eq!(args.layers, Some(vec!["a/b".to_string(), "c".to_string()]));
        assert_eq!(args.epsg, Some(25832));
        assert_eq!((args.width, args.height), (800, 600));
        assert_eq!(args.bbox.as_deref(), Some("-10,-5,10,5"));
        assert_eq!(args.expand, 10.0);
        assert!(args.cut);
        assert_eq!(args.file_name.as_deref(), Some("bonn"));
        assert_eq!(args.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_bbox_and_bbox_file_conflict() {
        let result =
            Cli::try_parse_from(["wms", "map", "-b", "0,0,1,1", "-B", "boxes.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_cap_aliases() {
        let cli = Cli::try_parse_from(["wms", "getcap", "-f", "-e", "--json"]).unwrap();
        let Command::Cap(args) = cli.command else {
            panic!("expected cap command");
        };
        assert!(args.formats && args.epsg && args.json);
        assert!(!args.layers);
        assert_eq!(cli.log_level, "warn");
    }
}
