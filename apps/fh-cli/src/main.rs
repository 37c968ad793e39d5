use clap::{Parser, Subcommand, ValueEnum};
use fh_app::{AppError, ConfigError, ControllerConfig, load_yaml, to_yaml_string};
use fh_core::ParamId;
use fh_sim::{PlantConfig, SimError, SimOptions, SimSample, Simulation};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "fh-cli")]
#[command(about = "Floor-heating controller CLI - config checks and closed-loop simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a controller config file
    Validate {
        /// Path to the controller YAML file
        config_path: PathBuf,
    },
    /// Print the effective config with all defaults filled in
    ShowConfig {
        /// Path to the controller YAML file (defaults only if omitted)
        config_path: Option<PathBuf>,
    },
    /// List the settable parameters
    Params,
    /// Run the controller against a simulated plant
    Simulate {
        /// Path to the controller YAML file (defaults if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path to a plant YAML file (defaults if omitted)
        #[arg(long)]
        plant: Option<PathBuf>,
        /// Simulated time in seconds
        #[arg(long, default_value_t = 7200)]
        t_end: u64,
        /// Sample interval in seconds
        #[arg(long, default_value_t = 60)]
        record_every: u64,
        /// Actual valve opening at boot
        #[arg(long, default_value_t = 0.0)]
        initial_valve: f64,
        /// Parameter update applied at start, as name=value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Plant file error: {0}")]
    Plant(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected parameter update: {0}")]
    Rejected(String),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::ShowConfig { config_path } => cmd_show_config(config_path.as_deref()),
        Commands::Params => {
            cmd_params();
            Ok(())
        }
        Commands::Simulate {
            config,
            plant,
            t_end,
            record_every,
            initial_valve,
            sets,
            format,
            output,
        } => {
            let opts = SimOptions {
                t_end_s: t_end,
                record_every_s: record_every,
                initial_valve_position: initial_valve,
            };
            cmd_simulate(
                config.as_deref(),
                plant.as_deref(),
                &opts,
                &sets,
                format,
                output.as_deref(),
            )
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ControllerConfig> {
    match path {
        Some(path) => Ok(load_yaml(path)?),
        None => Ok(ControllerConfig::default()),
    }
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = load_yaml(config_path)?;
    println!("✓ Config is valid");
    println!(
        "  valve full travel: {:.1} s, recalibration every {} h",
        config.valve.full_travel().as_secs_f64(),
        config.valve.recalibration_interval_s / 3600
    );
    println!(
        "  regulation every {} s, grace period {} s",
        config.schedule.regulation_s, config.orchestrator.grace_period_s
    );
    Ok(())
}

fn cmd_show_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    print!("{}", to_yaml_string(&config)?);
    Ok(())
}

fn cmd_params() {
    println!("Settable parameters:");
    for param in ParamId::ALL {
        println!("  {}", param);
    }
}

fn cmd_simulate(
    config_path: Option<&Path>,
    plant_path: Option<&Path>,
    opts: &SimOptions,
    sets: &[String],
    format: Format,
    output: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let plant: PlantConfig = match plant_path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => PlantConfig::default(),
    };

    let mut sim = Simulation::new(&config, plant, opts.initial_valve_position)?;
    for set in sets {
        let (name, value) = set
            .split_once('=')
            .ok_or_else(|| CliError::Rejected(set.clone()))?;
        if !sim.controller_mut().on_set(name.trim(), value) {
            return Err(CliError::Rejected(set.clone()));
        }
        info!(param = name.trim(), value, "parameter applied");
    }

    let samples = sim.run(opts)?;
    let rendered = match format {
        Format::Csv => render_csv(&samples),
        Format::Json => serde_json::to_string_pretty(&samples)? + "\n",
    };

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        println!("✓ Wrote {} samples to {}", samples.len(), path.display());
    } else {
        print!("{}", rendered);
    }
    Ok(())
}

fn render_csv(samples: &[SimSample]) -> String {
    let mut csv = String::from(
        "time_s,outside_c,flow_c,return_c,measured_flow_c,target_flow_c,valve_target,valve_estimate,valve_actual,calibrating\n",
    );
    for s in samples {
        csv.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{},{},{},{:.1},{}\n",
            s.t_s,
            s.outside_c,
            s.flow_c,
            s.return_c,
            s.measured_flow_c,
            s.target_flow_c.map(|t| format!("{t:.2}")).unwrap_or_default(),
            s.valve_target.map(|t| t.to_string()).unwrap_or_default(),
            s.valve_estimate,
            s.valve_actual,
            s.calibrating,
        ));
    }
    csv
}
