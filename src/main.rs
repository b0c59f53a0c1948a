//! lnoi400-pdk: command-line access to the LNOI400 technology and
//! component library.
//!
//! All results are written to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, Level};
use tracing_subscriber::EnvFilter;

use lnoi400_pdk::components::{self, CATALOG};
use lnoi400_pdk::config::{self, Config};
use lnoi400_pdk::technology::{set_default_technology, Technology};
use lnoi400_pdk::utils::{cpw_spec, CpwTarget};

/// Parametric LNOI400 technology and component library.
#[derive(Parser, Debug)]
#[command(name = "lnoi400-pdk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the technology built from the configured parameters
    Technology,

    /// List the available component generators
    List,

    /// Generate a component
    Generate {
        /// Generator name, as printed by `list`
        name: String,

        /// Generator parameters as a JSON object; omitted fields take defaults
        #[arg(short, long, value_name = "JSON")]
        params: Option<String>,
    },

    /// Size a coplanar waveguide for a target impedance
    Cpw {
        /// Target characteristic impedance (Ω)
        #[arg(long)]
        impedance: f64,

        /// Signal conductor width (µm)
        #[arg(long)]
        signal_width: f64,

        /// Ground conductor width (µm)
        #[arg(long)]
        ground_width: f64,

        /// Metal layer
        #[arg(long, default_value = "TL")]
        layer: String,
    },
}

/// Catalog listing entry.
#[derive(Serialize)]
struct CatalogEntry {
    name: &'static str,
    description: &'static str,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)]
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Runs one subcommand and returns its JSON output.
fn run(command: &Command, tech: &Technology, pretty: bool) -> Result<String, Box<dyn std::error::Error>> {
    let output = match command {
        Command::Technology => to_json(tech, pretty)?,
        Command::List => {
            let mut entries: Vec<CatalogEntry> = CATALOG
                .iter()
                .map(|e| CatalogEntry {
                    name: e.name,
                    description: e.description,
                })
                .collect();
            entries.sort_by_key(|e| e.name);
            to_json(&entries, pretty)?
        }
        Command::Generate { name, params } => {
            let params = match params {
                Some(json) => serde_json::from_str(json)?,
                None => serde_json::Value::Null,
            };
            let component = components::generate(name, &params, Some(tech))?;
            debug!(component = %component.name, ports = component.ports.len(), "generated");
            to_json(&component, pretty)?
        }
        Command::Cpw {
            impedance,
            signal_width,
            ground_width,
            layer,
        } => {
            let target = CpwTarget {
                layer: layer.clone(),
                ..CpwTarget::new(*impedance, *signal_width, *ground_width)
            };
            to_json(&cpw_spec(&target, tech)?, pretty)?
        }
    };
    Ok(output)
}

/// Entry point for the lnoi400-pdk tool.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg: Config = match config::load_config_or_default(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("  caused by: {source}");
            }
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    let tech = match cfg.technology.build() {
        Ok(tech) => Arc::new(tech),
        Err(e) => {
            error!(error = %e, "invalid technology parameters");
            return ExitCode::FAILURE;
        }
    };
    set_default_technology(Arc::clone(&tech));

    match run(&args.command, &tech, cfg.output.pretty) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnoi400_pdk::technology::TechnologyParams;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(get_log_level(3, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "DEBUG"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
        assert_eq!(get_log_level(2, false, "error"), Level::DEBUG);
    }

    #[test]
    fn parse_generate_command() {
        let args = Args::try_parse_from([
            "lnoi400-pdk",
            "generate",
            "straight",
            "--params",
            r#"{"length": 20}"#,
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Generate { ref name, .. } if name == "straight"));
    }

    #[test]
    fn generate_outputs_component_json() {
        let tech = TechnologyParams::default().build().unwrap();
        let command = Command::Generate {
            name: "straight".into(),
            params: Some(r#"{"length": 20}"#.into()),
        };
        let output = run(&command, &tech, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["name"], "STRAIGHT_L20000_RWG1000");
        assert_eq!(value["ports"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn list_is_sorted() {
        let tech = TechnologyParams::default().build().unwrap();
        let output = run(&Command::List, &tech, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, components::component_names());
    }

    #[test]
    fn unrealizable_cpw_fails() {
        let tech = TechnologyParams::default().build().unwrap();
        let command = Command::Cpw {
            impedance: 500.0,
            signal_width: 10.0,
            ground_width: 180.0,
            layer: "TL".into(),
        };
        assert!(run(&command, &tech, true).is_err());
    }
}
