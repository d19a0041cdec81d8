use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use checkin_triage::checkin::{Appetite, CheckIn, DataFile, DeviceReadings, Mobility};
use checkin_triage::dashboard::{self, DateRange};
use checkin_triage::output;
use checkin_triage::scoring::{self, ScoredCheckIn, Status, ValidationErrors};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 1;
const EXIT_VALIDATION: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum SortOrder {
    /// Highest risk first
    #[default]
    Risk,
    /// Newest first
    Date,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every check-in in the data files (default if no subcommand)
    Score {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Only show check-ins with this status (normal, follow-up, escalated)
        #[arg(long)]
        status: Option<Status>,
        /// Only show check-ins of this patient
        #[arg(long)]
        patient: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        sort: SortOrder,
    },
    /// Validate and record a new check-in, then print its score
    Add {
        #[arg(long)]
        patient: String,
        /// Check-in date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 0)]
        fatigue: u8,
        #[arg(long, default_value_t = 0)]
        breathlessness: u8,
        #[arg(long, default_value_t = 0)]
        cough: u8,
        #[arg(long, default_value_t = 0)]
        pain: u8,
        #[arg(long, default_value_t = 0)]
        nausea: u8,
        #[arg(long, default_value_t = 0)]
        dizziness: u8,
        #[arg(long, default_value_t = 0)]
        swelling: u8,
        #[arg(long, default_value_t = 0)]
        anxiety: u8,
        /// Hours slept last night
        #[arg(long, allow_hyphen_values = true)]
        sleep: f64,
        #[arg(long)]
        missed_meds: bool,
        #[arg(long)]
        appetite: Option<Appetite>,
        #[arg(long)]
        mobility: Option<Mobility>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        spo2: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        bp_systolic: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        bp_diastolic: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        weight: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        glucose: Option<f64>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show one patient's check-ins, newest first
    History {
        #[arg(long)]
        patient: String,
        /// How far back to look, e.g. 30d or 2w (ignored with --from)
        #[arg(long, default_value = "30d")]
        window: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End of a --from range (defaults to today)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List patients with their latest status
    Patients {
        /// Case-insensitive search over name and condition
        #[arg(long)]
        search: Option<String>,
    },
    /// Show check-in rate, flagged check-ins, trends and the follow-up queue
    Dashboard {
        /// KPI window, e.g. 7d (defaults to config)
        #[arg(long)]
        window: Option<String>,
        /// Per-day trend window, e.g. 30d (defaults to config)
        #[arg(long)]
        trend: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Create a config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
        /// Accept all defaults without prompting
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "checkin-triage")]
#[command(about = "Score patient check-ins and surface the ones that need follow-up", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/checkin-triage/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Data file or glob; repeatable, overrides `data` from config
    #[arg(short, long, global = true)]
    data: Vec<String>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,checkin_triage=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

fn parse_window_or_exit(label: &str, value: &str) -> u32 {
    match dashboard::parse_window(value) {
        Ok(days) => days,
        Err(e) => exit_with(EXIT_CONFIG, format!("Invalid {}: {:#}", label, e)),
    }
}

fn print_rows(rows: &[&ScoredCheckIn], format: OutputFormat, verbose: bool, use_colors: bool) {
    match format {
        OutputFormat::Table => {
            println!("{}", output::format_scored_table(rows, use_colors));
            if verbose {
                // Verbose mode: how each risk score was reached
                for (idx, row) in rows.iter().enumerate() {
                    println!();
                    println!(
                        "{:>2}. {} {}",
                        idx + 1,
                        row.check_in().date,
                        row.check_in().patient_id
                    );
                    println!(
                        "{}",
                        output::format_breakdown(&scoring::explain(row.check_in()))
                    );
                }
            }
        }
        OutputFormat::Tsv => {
            if !rows.is_empty() {
                println!("{}", output::format_tsv(rows));
            }
        }
        OutputFormat::Json => match output::format_json(rows) {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with(EXIT_DATA, format!("Failed to serialize check-ins: {}", e)),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Score {
        format: OutputFormat::default(),
        status: None,
        patient: None,
        sort: SortOrder::default(),
    });
    let start_time = Instant::now();
    let use_colors = !cli.no_color && output::should_use_colors();
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let config_path = cli.config.map(PathBuf::from);

    // Init runs before loading config: the config may not exist yet
    if let Commands::Init { force, yes } = command {
        match checkin_triage::config::run_init_wizard(config_path, yes, force) {
            Ok(path) => {
                println!("Config written to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => exit_with(EXIT_CONFIG, format!("Init failed: {:#}", e)),
        }
    }

    let config = match checkin_triage::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate config at startup
    if let Err(errors) = checkin_triage::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let data_patterns = if cli.data.is_empty() {
        config.data.clone()
    } else {
        cli.data.clone()
    };
    if data_patterns.is_empty() {
        eprintln!("No data files configured.");
        eprintln!("Pass --data <file> or add them to ~/.config/checkin-triage/config.yaml:");
        eprintln!("  data:");
        eprintln!("    - ~/health/checkins.json");
        eprintln!("Or run `checkin-triage init` to create a config.");
        std::process::exit(EXIT_CONFIG);
    }
    debug!("Data files: {}", data_patterns.join(", "));

    if let Commands::Add { .. } = command {
        run_add(command, &data_patterns, today, cli.verbose, use_colors);
        std::process::exit(EXIT_SUCCESS);
    }

    let data = match checkin_triage::checkin::load_many(&data_patterns) {
        Ok(d) => d,
        Err(e) => exit_with(EXIT_DATA, format!("Data error: {:#}", e)),
    };
    let DataFile {
        patients,
        check_ins,
        ..
    } = data;
    let scored = scoring::score_all(check_ins);
    debug!(
        "Scored {} check-ins for {} patients in {:?}",
        scored.len(),
        patients.len(),
        start_time.elapsed()
    );

    match command {
        Commands::Score {
            format,
            status,
            patient,
            sort,
        } => {
            let mut rows: Vec<&ScoredCheckIn> = scored
                .iter()
                .filter(|r| status.map_or(true, |s| r.status() == s))
                .filter(|r| {
                    patient
                        .as_deref()
                        .map_or(true, |p| r.check_in().patient_id == p)
                })
                .collect();

            match sort {
                SortOrder::Risk => rows.sort_by(|a, b| {
                    // Primary: risk descending, then newest first
                    b.risk_score()
                        .partial_cmp(&a.risk_score())
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.check_in().date.cmp(&a.check_in().date))
                        .then_with(|| a.check_in().patient_id.cmp(&b.check_in().patient_id))
                }),
                SortOrder::Date => rows.sort_by(|a, b| {
                    b.check_in()
                        .date
                        .cmp(&a.check_in().date)
                        .then_with(|| a.check_in().patient_id.cmp(&b.check_in().patient_id))
                }),
            }

            print_rows(&rows, format, cli.verbose, use_colors);

            if cli.verbose {
                eprintln!();
                for (status, count) in dashboard::status_counts(&scored) {
                    eprintln!("  {}: {}", status, count);
                }
                eprintln!(
                    "Total: {} check-ins in {:?}",
                    rows.len(),
                    start_time.elapsed()
                );
            }
        }
        Commands::History {
            patient,
            window,
            from,
            to,
            format,
        } => {
            let range = match from {
                Some(start) => match DateRange::custom(start, to.unwrap_or(today)) {
                    Ok(r) => r,
                    Err(e) => exit_with(EXIT_CONFIG, format!("Invalid range: {:#}", e)),
                },
                None => DateRange::last_days(today, parse_window_or_exit("window", &window)),
            };

            let roster_entry = patients.iter().find(|p| p.id == patient);
            if roster_entry.is_none() && !patients.is_empty() {
                exit_with(EXIT_DATA, format!("Unknown patient '{}'", patient));
            }

            let rows = dashboard::history(&scored, &patient, &range);
            if let OutputFormat::Table = format {
                let detail = dashboard::patient_detail(&scored, &patient);
                println!(
                    "{}",
                    output::format_patient_detail(&detail, roster_entry, use_colors)
                );
                println!("  Showing {} to {}", range.start(), range.end());
                println!();
            }
            print_rows(&rows, format, cli.verbose, use_colors);
        }
        Commands::Patients { search } => {
            let rows = dashboard::roster(&patients, &scored, search.as_deref());
            println!("{}", output::format_roster(&rows, use_colors));
        }
        Commands::Dashboard {
            window,
            trend,
            json,
        } => {
            let window = window.unwrap_or_else(|| config.window().to_string());
            let trend = trend.unwrap_or_else(|| config.trend().to_string());
            let window_days = parse_window_or_exit("window", &window);
            let trend_days = parse_window_or_exit("trend", &trend);

            let summary = dashboard::summarize(&patients, &scored, today, window_days, trend_days);
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_DATA, format!("Failed to serialize dashboard: {}", e)),
                }
            } else {
                println!(
                    "{}",
                    output::format_dashboard(&summary, &patients, use_colors)
                );
            }
        }
        Commands::Add { .. } | Commands::Init { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

fn run_add(
    command: Commands,
    data_patterns: &[String],
    today: NaiveDate,
    verbose: bool,
    use_colors: bool,
) {
    let Commands::Add {
        patient,
        date,
        fatigue,
        breathlessness,
        cough,
        pain,
        nausea,
        dizziness,
        swelling,
        anxiety,
        sleep,
        missed_meds,
        appetite,
        mobility,
        notes,
        spo2,
        bp_systolic,
        bp_diastolic,
        weight,
        glucose,
        format,
    } = command
    else {
        return;
    };

    // New check-ins go to the first data file, which must be a plain path
    let target = &data_patterns[0];
    if target.contains(['*', '?', '[']) {
        exit_with(
            EXIT_CONFIG,
            format!(
                "Cannot add a check-in to glob pattern '{}'; pass --data <file>",
                target
            ),
        );
    }
    let path = checkin_triage::config::expand_home(target);

    let devices = DeviceReadings {
        spo2,
        bp_systolic,
        bp_diastolic,
        weight_kg: weight,
        glucose_mgdl: glucose,
    };

    let mut check_in = CheckIn::new(patient, date.unwrap_or(today)).with_symptoms([
        fatigue,
        breathlessness,
        cough,
        pain,
        nausea,
        dizziness,
        swelling,
        anxiety,
    ]);
    check_in.sleep_hours = sleep;
    check_in.meds_taken = !missed_meds;
    check_in.appetite = appetite.unwrap_or_default();
    check_in.mobility = mobility.unwrap_or_default();
    check_in.notes = notes.filter(|n| !n.trim().is_empty());
    check_in.devices = (!devices.is_empty()).then_some(devices);

    let recorded = match checkin_triage::checkin::append_check_in(&path, check_in) {
        Ok(c) => c,
        Err(e) => {
            if let Some(errors) = e.downcast_ref::<ValidationErrors>() {
                eprintln!("Check-in rejected:");
                for error in errors.iter() {
                    eprintln!("  - {}", error);
                }
                std::process::exit(EXIT_VALIDATION);
            }
            exit_with(EXIT_DATA, format!("Data error: {:#}", e));
        }
    };

    let scored = scoring::classify(recorded);
    print_rows(&[&scored], format, verbose, use_colors);
}
