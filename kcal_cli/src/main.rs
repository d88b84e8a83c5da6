use chrono::Utc;
use clap::{Parser, Subcommand};
use kcal_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kcal")]
#[command(about = "Workout calorie estimator and history tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate calories for a workout without recording it
    Estimate {
        /// Workout type (e.g. running, swimming, "weight training")
        #[arg(long = "type")]
        workout_type: String,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,

        /// Intensity (low, medium, high)
        #[arg(long, default_value = "medium")]
        intensity: String,

        /// Print the JSON response/error payload instead of text
        #[arg(long)]
        json: bool,
    },

    /// Estimate calories and record the workout
    Log {
        /// Workout type
        #[arg(long = "type", required_unless_present = "preset")]
        workout_type: Option<String>,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true, required_unless_present = "preset")]
        duration: Option<i64>,

        /// Intensity (low, medium, high) [default: medium, or the preset's]
        #[arg(long)]
        intensity: Option<String>,

        /// Use a quick-start preset (see `kcal presets`)
        #[arg(long, conflicts_with_all = ["workout_type", "duration"])]
        preset: Option<String>,
    },

    /// Show recorded workouts
    History,

    /// Delete a recorded workout by id
    Delete {
        /// Workout id (shown by `kcal history`)
        id: String,
    },

    /// Show aggregate statistics
    Stats,

    /// Export the workout history
    Export {
        /// Output format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file (defaults to workout-data-YYYY-MM-DD.<ext>)
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },

    /// List quick-start presets
    Presets,
}

/// Why a command failed
enum Failure {
    /// Already explained on stderr (or as a JSON payload on stdout)
    Reported,
    Error(Error),
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Failure::Error(e)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(e: serde_json::Error) -> Self {
        Failure::Error(e.into())
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Failure::Error(e.into())
    }
}

type CmdResult = std::result::Result<(), Failure>;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    kcal_core::logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Reported) => ExitCode::FAILURE,
        Err(Failure::Error(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CmdResult {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let history_path = Config::history_path(&data_dir);

    match cli.command {
        Commands::Estimate {
            workout_type,
            duration,
            intensity,
            json,
        } => cmd_estimate(&config, &workout_type, duration, &intensity, json).await,
        Commands::Log {
            workout_type,
            duration,
            intensity,
            preset,
        } => cmd_log(&config, history_path, workout_type, duration, intensity, preset).await,
        Commands::History => cmd_history(&config, history_path),
        Commands::Delete { id } => cmd_delete(history_path, &id),
        Commands::Stats => cmd_stats(history_path),
        Commands::Export {
            format,
            output,
            stdout,
        } => cmd_export(&config, history_path, &format, output, stdout),
        Commands::Presets => cmd_presets(),
    }
}

/// Build the estimation service, reporting configuration problems up front
fn build_service(config: &Config) -> Result<EstimationService> {
    EstimatorConfig::from_env(&config.estimator).and_then(|c| EstimationService::from_config(&c))
}

fn report_failure(err: Error) -> Failure {
    eprintln!("Could not calculate calories: {}", err);
    Failure::Reported
}

async fn cmd_estimate(
    config: &Config,
    workout_type: &str,
    duration: i64,
    intensity: &str,
    json: bool,
) -> CmdResult {
    let request = EstimateRequest {
        workout_type: workout_type.to_string(),
        duration_minutes: duration,
        intensity: intensity.to_string(),
    };

    let outcome = match build_service(config) {
        Ok(service) => service.handle(&request).await,
        Err(e) => Err(ErrorPayload::from_error(&e)),
    };

    match outcome {
        Ok(response) => {
            if json {
                println!("{}", serde_json::to_string(&response)?);
            } else {
                println!("{} kcal", response.calories);
            }
            Ok(())
        }
        Err(payload) => {
            if json {
                println!("{}", serde_json::to_string(&payload)?);
            } else {
                eprintln!(
                    "Could not calculate calories: {}",
                    payload.details.as_deref().unwrap_or(&payload.error)
                );
            }
            Err(Failure::Reported)
        }
    }
}

async fn cmd_log(
    config: &Config,
    history_path: PathBuf,
    workout_type: Option<String>,
    duration: Option<i64>,
    intensity: Option<String>,
    preset: Option<String>,
) -> CmdResult {
    let params = match preset {
        Some(name) => preset_params(&name, intensity.as_deref()),
        None => WorkoutParams::validate(
            workout_type.as_deref().unwrap_or_default(),
            duration.unwrap_or_default(),
            intensity.as_deref().unwrap_or("medium"),
        ),
    }
    .map_err(report_failure)?;

    let service = build_service(config).map_err(report_failure)?;
    tracing::debug!("Logging {:?} to {:?}", params, history_path);
    let estimate = service.estimate_params(&params).await;

    let record = WorkoutRecord::new(&params, estimate.calories);
    let storage = JsonFileStorage::new(&history_path);
    let _lock = storage.lock()?;
    let mut store = HistoryStore::load(storage);
    store.append(record.clone())?;

    let dates = DateStyle::new(config.export.date_format.clone())?;
    println!("✓ Workout logged!");
    println!(
        "  {} · {} min · {} · {} kcal",
        record.workout_type(),
        record.duration_minutes(),
        record.display_intensity(),
        record.calories()
    );
    if estimate.source == EstimateSource::Fallback {
        println!("  (estimated with the built-in formula)");
    }
    println!("  Date: {}", dates.render(record.recorded_at()));
    println!("  Id:   {}", record.id());
    Ok(())
}

/// Parameters for a preset, with an optional intensity override
fn preset_params(name: &str, intensity: Option<&str>) -> Result<WorkoutParams> {
    let preset = find_preset(name).ok_or_else(|| {
        Error::Validation(format!("unknown preset '{}' (see `kcal presets`)", name))
    })?;
    let intensity = match intensity {
        Some(label) => label.parse::<Intensity>()?,
        None => preset.intensity(),
    };
    Ok(WorkoutParams {
        workout_type: preset.name.to_string(),
        duration_minutes: preset.default_duration_minutes,
        intensity,
    })
}

fn cmd_history(config: &Config, history_path: PathBuf) -> CmdResult {
    let store = HistoryStore::load(JsonFileStorage::new(&history_path));
    if store.is_empty() {
        println!("No workouts recorded yet. Start tracking your fitness journey!");
        return Ok(());
    }

    let dates = DateStyle::new(config.export.date_format.clone())?;
    println!(
        "{:<12} {:<20} {:>9} {:<9} {:>9}  {}",
        "Date", "Workout", "Duration", "Intensity", "Calories", "Id"
    );
    for record in store.records() {
        println!(
            "{:<12} {:<20} {:>5} min {:<9} {:>4} kcal  {}",
            dates.render(record.recorded_at()),
            record.workout_type(),
            record.duration_minutes(),
            record.display_intensity(),
            record.calories(),
            record.id()
        );
    }
    Ok(())
}

fn cmd_delete(history_path: PathBuf, id: &str) -> CmdResult {
    let storage = JsonFileStorage::new(&history_path);
    let _lock = storage.lock()?;
    let mut store = HistoryStore::load(storage);
    let removed = store.delete(id)?;
    if removed == 0 {
        println!("No workout with id {} - nothing deleted.", id);
    } else {
        println!("✓ Deleted workout {}", id);
    }
    Ok(())
}

fn cmd_stats(history_path: PathBuf) -> CmdResult {
    let store = HistoryStore::load(JsonFileStorage::new(&history_path));
    let Some(stats) = store.stats() else {
        println!("No workouts recorded yet.");
        return Ok(());
    };

    println!("Workout Analysis");
    println!("  Total workouts:      {}", stats.total_workouts);
    println!("  Total calories:      {} kcal", stats.total_calories);
    println!("  Total duration:      {} min", stats.total_duration);
    println!("  Avg calories/workout: {} kcal", stats.avg_calories_per_workout);
    println!("  Avg duration:        {} min", stats.avg_duration);
    println!("  Most frequent:       {}", stats.most_frequent_workout);
    Ok(())
}

fn cmd_export(
    config: &Config,
    history_path: PathBuf,
    format: &str,
    output: Option<PathBuf>,
    stdout: bool,
) -> CmdResult {
    let format: ExportFormat = format.parse()?;
    let store = HistoryStore::load(JsonFileStorage::new(&history_path));

    let contents = match format {
        ExportFormat::Json => store.export_json()?,
        ExportFormat::Csv => {
            let dates = DateStyle::new(config.export.date_format.clone())?;
            store.export_csv(&dates)?
        }
    };

    if stdout {
        println!("{}", contents);
        return Ok(());
    }

    let path =
        output.unwrap_or_else(|| PathBuf::from(format.default_file_name(Utc::now().date_naive())));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, contents)?;

    println!("✓ Exported {} workouts as {}", store.len(), format);
    println!("  File: {}", path.display());
    Ok(())
}

fn cmd_presets() -> CmdResult {
    println!("Quick Start");
    for preset in default_presets() {
        println!(
            "  {:<16} {} min",
            preset.name, preset.default_duration_minutes
        );
    }
    println!();
    println!("Use `kcal log --preset <name>` to log one at medium intensity");
    println!("(or pass --intensity low|high).");
    Ok(())
}
