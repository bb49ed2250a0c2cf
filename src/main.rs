//! gmapi CLI
//!
//! Usage:
//!   gmapi [OPTIONS] inspect [FILE]   Initialize every map container in a page
//!   gmapi [OPTIONS] resolve [FILE]   Resolve one JSON map configuration
//!   gmapi [OPTIONS] render [FILE]    Render container markup for a configuration
//!
//! Options:
//!   -c, --config <FILE>      Host configuration (TOML format)
//!   -l, --log-level <LEVEL>  Log filter used when RUST_LOG is unset [default: warn]
//!   -h, --help               Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use gmapi::sdk::{self, describe_lat_lng, Instance};
use gmapi::{init_page, Error, HostConfig, MapBuilder, MapContainer, Resolver, Widget};

#[derive(Parser)]
#[command(name = "gmapi")]
#[command(about = "Resolve declarative map configurations into live maps")]
struct Cli {
    /// Host configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover and initialize every map container in page markup
    Inspect {
        /// Page file (reads from stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Resolve one JSON configuration and print a summary of the result
    Resolve {
        /// Configuration file (reads from stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Render container markup embedding a JSON map configuration
    Render {
        /// Configuration file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Container id
        #[arg(short, long, default_value = "map")]
        name: String,

        /// Width in pixels (defaults to the configured viewport)
        #[arg(long)]
        width: Option<u32>,

        /// Height in pixels (defaults to the configured viewport)
        #[arg(long)]
        height: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match &cli.config {
        Some(path) => match HostConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => HostConfig::default(),
    };

    let (input, filename) = match &cli.command {
        Command::Inspect { input } | Command::Resolve { input } | Command::Render { input, .. } => {
            (input.as_deref(), display_name(input.as_deref()))
        }
    };
    let source = match read_input(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", filename, e);
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Inspect { .. } => inspect(&source, &config),
        Command::Resolve { .. } => resolve(&source, &config),
        Command::Render {
            name,
            width,
            height,
            ..
        } => render(&source, &config, name, *width, *height),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn display_name(input: Option<&Path>) -> String {
    input.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

fn read_input(input: Option<&Path>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn inspect(source: &str, config: &HostConfig) -> Result<String, Error> {
    let ns = sdk::namespace()?;
    let containers = init_page(source, &ns, config)?;
    let summary: Vec<Value> = containers.iter().map(describe_container).collect();
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn describe_container<H: Clone + 'static>(container: &MapContainer<'_, H>) -> Value {
    let map = container.map().map(|m| Instance::Map(m.clone()).describe());
    let markers: Vec<Value> = container
        .markers()
        .iter()
        .map(|m| {
            json!({
                "position": describe_lat_lng(m.position()),
                "title": m.title(),
                "attached": m.map().is_some(),
            })
        })
        .collect();
    json!({
        "id": container.id(),
        "map": map,
        "markers": markers,
        "loaded": container.load_state().is_revealed(),
    })
}

fn resolve(source: &str, config: &HostConfig) -> Result<String, Error> {
    let value: Value = serde_json::from_str(source)?;
    let ns = sdk::namespace()?;
    let resolved = Resolver::with_options(&ns, config.resolve_options()).resolve(&value, &())?;
    Ok(serde_json::to_string_pretty(&resolved.to_json_with(&config.placeholder_sentinel))?)
}

fn render(
    source: &str,
    config: &HostConfig,
    name: &str,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<String, Error> {
    let value: Value = serde_json::from_str(source)?;
    let ns = sdk::namespace()?;
    let mut host = MapContainer::new(name, (), (), &ns).with_config(config);
    let map = host.new_map(&value)?;
    let preview = MapBuilder::from_map(&map);
    let widget = Widget::new(name).with_config(config).with_size(
        width.unwrap_or(config.viewport.width),
        height.unwrap_or(config.viewport.height),
    );
    Ok(widget.render_value(&value, &preview))
}
