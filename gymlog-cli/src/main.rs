mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use gymlog::catalog::{Category, filter_catalog, group_by_category};
use gymlog::db::models::WorkoutDetail;
use gymlog::logging::{init_logger, parse_level};
use gymlog::metrics::{
    ExerciseSession, MetricKey, MetricPoint, Summary, compute_series, summarize,
};
use gymlog::{Config, GymlogError, Tracker};

#[derive(Parser, Debug)]
#[command(version, about = "Gymlog - Workout Tracker CLI", long_about = None)]
struct Args {
    /// SQLite database path, or :memory:
    #[arg(long, global = true)]
    database: Option<String>,
    /// Whose workouts to work with
    #[arg(short, long, global = true)]
    user: Option<String>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the exercise catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogCommand,
    },
    /// Log the workout in progress
    Workout {
        #[command(subcommand)]
        action: WorkoutCommand,
    },
    /// List past workouts, most recent first
    History {
        #[arg(short, long)]
        verbose: bool,
        #[command(subcommand)]
        action: Option<HistoryCommand>,
    },
    /// List every exercise that has been logged
    Exercises,
    /// Show the progression of one exercise
    Progress {
        name: String,
        #[arg(short, long, default_value = "max-weight")]
        metric: MetricKey,
        #[arg(long)]
        json: bool,
    },
    /// Compute a progression from a JSON file of session records
    Series {
        file: PathBuf,
        #[arg(short, long, default_value = "max-weight")]
        metric: MetricKey,
        #[arg(long)]
        json: bool,
    },
    /// Interactive progression charts
    Chart { name: Option<String> },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    List {
        #[arg(short, long)]
        filter: Option<String>,
    },
    Add {
        name: String,
        #[arg(short, long, default_value = "other")]
        category: Category,
    },
    Remove { id: i32 },
    /// Autocomplete an exercise name from the catalog
    Suggest { text: String },
}

#[derive(Subcommand, Debug)]
enum WorkoutCommand {
    /// Start a new workout, completing the one in progress
    Start {
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Begin the next exercise
    Exercise { name: String },
    /// Record a set on the current exercise
    Set {
        #[arg(short, long)]
        weight: f64,
        #[arg(short, long, allow_negative_numbers = true)]
        reps: i64,
    },
    /// Record the rest taken after the last set
    Rest {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    Status,
    Finish,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    Show { id: i32 },
    Delete {
        id: i32,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(database) = &args.database {
        config.database_url = database.clone();
    }
    if let Some(user) = &args.user {
        config.username = user.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = parse_level(level)
            .ok_or_else(|| GymlogError::InvalidConfig(format!("--log-level {}", level)))?;
    }
    Ok(config)
}

fn print_summary(summary: &Summary, metric: MetricKey) {
    let record = summary
        .record
        .map(|r| metric.format_value(r))
        .unwrap_or_else(|| "—".to_string());
    println!(
        "Latest: {} | Record: {} | Δ total: {} | Sessions: {}",
        metric.format_value(summary.latest),
        record,
        format!("{} {}", summary.delta_display(), metric.unit()).trim(),
        summary.count
    );
}

fn print_progress(name: &str, series: &[MetricPoint], metric: MetricKey, json: bool) -> Result<()> {
    let summary = summarize(series, metric);

    if json {
        let out = serde_json::json!({
            "exercise": name,
            "metric": metric.as_str(),
            "points": series,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if series.is_empty() {
        println!("No data for {}.", name);
        return Ok(());
    }

    println!("{} · {}", name, metric.label());
    for point in series {
        println!("  {}  {}", point.label, metric.format_value(point.value(metric)));
    }
    print_summary(&summary, metric);
    Ok(())
}

fn print_workout(detail: &WorkoutDetail, verbose: bool) {
    if verbose {
        print!("{}", detail);
    } else {
        println!(
            "#{} {} - {} exercises, {} sets",
            detail.workout.id,
            detail.workout.performed_at.format("%d/%m/%Y %H:%M"),
            detail.exercises.len(),
            detail.set_count()
        );
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn read_sessions(file: &Path) -> Result<Vec<ExerciseSession>> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut sessions: Vec<ExerciseSession> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse session records in {}", file.display()))?;
    for session in &sessions {
        session.validate()?;
    }
    if sessions.windows(2).any(|w| w[0].date > w[1].date) {
        warn!("Session records are not in date order, sorting them");
        sessions.sort_by_key(|s| s.date);
    }
    Ok(sessions)
}

async fn run_catalog(tracker: &Tracker, action: CatalogCommand) -> Result<()> {
    match action {
        CatalogCommand::List { filter } => {
            let catalog = tracker.catalog().await?;
            let filtered = filter_catalog(&catalog, filter.as_deref().unwrap_or(""));
            if filtered.is_empty() {
                println!("No exercises in the catalog.");
            }
            for (category, entries) in group_by_category(filtered) {
                println!("{}", category.to_uppercase());
                for entry in entries {
                    println!("  {:>4}  {}", entry.id, entry.name);
                }
            }
        }
        CatalogCommand::Add { name, category } => {
            let entry = tracker.add_catalog_exercise(&name, category).await?;
            println!("Added {} ({}) as #{}", entry.name, entry.category, entry.id);
        }
        CatalogCommand::Remove { id } => match tracker.remove_catalog_exercise(id).await? {
            0 => println!("No catalog exercise #{}", id),
            _ => println!("Removed catalog exercise #{}", id),
        },
        CatalogCommand::Suggest { text } => {
            for name in tracker.suggest_exercises(&text).await? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

async fn run_workout(tracker: &Tracker, action: WorkoutCommand) -> Result<()> {
    match action {
        WorkoutCommand::Start { notes } => {
            let workout = tracker.new_workout(&notes).await?;
            println!("Started workout #{}", workout.id);
        }
        WorkoutCommand::Exercise { name } => {
            let exercise = tracker.begin_exercise(&name).await?;
            println!(
                "Workout #{}: started {}",
                exercise.workout_id, exercise.name
            );
        }
        WorkoutCommand::Set { weight, reps } => {
            let set = tracker.add_set(weight, reps).await?;
            println!("{}", set);
            println!("Record the rest with `gymlog workout rest <seconds>`");
        }
        WorkoutCommand::Rest { seconds } => {
            let set = tracker.record_rest(seconds).await?;
            println!("{}", set);
        }
        WorkoutCommand::Status => match tracker.active_workout().await? {
            Some(detail) => print_workout(&detail, true),
            None => println!("No workout in progress."),
        },
        WorkoutCommand::Finish => {
            let workout = tracker.finish_workout().await?;
            println!("Finished workout #{}", workout.id);
        }
    }
    Ok(())
}

async fn run_history(
    tracker: &Tracker,
    verbose: bool,
    action: Option<HistoryCommand>,
) -> Result<()> {
    match action {
        None => {
            let history = tracker.history().await?;
            if history.is_empty() {
                println!("No workouts recorded.");
            }
            for detail in &history {
                print_workout(detail, verbose);
            }
        }
        Some(HistoryCommand::Show { id }) => match tracker.workout_detail(id).await? {
            Some(detail) => print_workout(&detail, true),
            None => println!("No workout #{}", id),
        },
        Some(HistoryCommand::Delete { id, yes }) => {
            if !yes && !confirm(&format!("Delete workout #{}?", id))? {
                println!("Kept workout #{}", id);
                return Ok(());
            }
            match tracker.delete_workout(id).await? {
                0 => println!("No workout #{}", id),
                _ => println!("Deleted workout #{}", id),
            }
        }
    }
    Ok(())
}

async fn open_tracker(config: &Config) -> Result<Tracker> {
    debug!(
        "Opening {} for user {}",
        config.database_url, config.username
    );
    Tracker::open(config).await
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logger(config.log_level);

    match args.command {
        Commands::Series { file, metric, json } => {
            let sessions = read_sessions(&file)?;
            let series = compute_series(&sessions, &config.aggregator);
            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            print_progress(&name, &series, metric, json)
        }
        Commands::Catalog { action } => run_catalog(&open_tracker(&config).await?, action).await,
        Commands::Workout { action } => run_workout(&open_tracker(&config).await?, action).await,
        Commands::History { verbose, action } => {
            run_history(&open_tracker(&config).await?, verbose, action).await
        }
        Commands::Exercises => {
            let names = open_tracker(&config).await?.logged_exercise_names().await?;
            if names.is_empty() {
                println!("No data yet. Log a workout to see progression.");
            }
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Progress { name, metric, json } => {
            let series = open_tracker(&config).await?.progression(&name).await?;
            print_progress(&name, &series, metric, json)
        }
        Commands::Chart { name } => {
            let tracker = open_tracker(&config).await?;
            let terminal = ratatui::init();
            let result = tui::run_progress_viewer(terminal, &tracker, name).await;
            ratatui::restore();
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymlog::metrics::AggregatorConfig;

    #[test]
    fn parses_nested_commands() {
        let args = Args::try_parse_from([
            "gymlog", "--user", "anna", "progress", "Bench Press", "--metric", "e1rm",
        ])
        .unwrap();
        assert_eq!(args.user.as_deref(), Some("anna"));
        match args.command {
            Commands::Progress { name, metric, json } => {
                assert_eq!(name, "Bench Press");
                assert_eq!(metric, MetricKey::EstimatedOneRepMax);
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args =
            Args::try_parse_from(["gymlog", "catalog", "add", "Squat", "-c", "legs"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Catalog {
                action: CatalogCommand::Add {
                    category: Category::Legs,
                    ..
                }
            }
        ));
    }

    #[test]
    fn rejects_unknown_metrics_and_categories() {
        assert!(Args::try_parse_from(["gymlog", "progress", "Squat", "-m", "speed"]).is_err());
        assert!(Args::try_parse_from(["gymlog", "catalog", "add", "Run", "-c", "cardio"]).is_err());
    }

    #[test]
    fn workout_set_takes_weight_and_reps() {
        let args =
            Args::try_parse_from(["gymlog", "workout", "set", "-w", "42.5", "-r", "8"]).unwrap();
        match args.command {
            Commands::Workout {
                action: WorkoutCommand::Set { weight, reps },
            } => assert_eq!((weight, reps), (42.5, 8)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn reads_and_sorts_session_records() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bench.json");
        std::fs::write(
            &file,
            r#"[
                {"date": "2024-01-08", "sets": [{"weightKg": 45, "repetitions": 6}]},
                {"date": "2024-01-01", "sets": [{"weightKg": 40, "repetitions": 10}, {"weightKg": 40, "repetitions": 8}]}
            ]"#,
        )
        .unwrap();

        let sessions = read_sessions(&file).unwrap();
        let series = compute_series(&sessions, &AggregatorConfig::default());
        assert_eq!(series[0].volume, 720.0);
        assert_eq!(series[1].max_weight, 45.0);
    }

    #[test]
    fn missing_series_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_sessions(&dir.path().join("missing.json")).is_err());
    }
}
