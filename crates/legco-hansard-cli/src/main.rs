use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{FuturesUnordered, StreamExt};
use legco_hansard::utils::{ParseStats, session_date_from_name};
use legco_hansard::{
    Hansard, Language, LanguageConfig, MarkerSet, MissingNamePolicy, ParseError, ParseOptions,
};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "legco-hansard")]
#[command(about = "A Legislative Council Hansard parser", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one cleaned Hansard document into attendance, sections and dialogue
    Parse {
        #[arg(help = "Path of the cleaned HTML document")]
        file: PathBuf,

        #[arg(
            long,
            value_parser = parse_language,
            help = "Language variant of the document (e, c)"
        )]
        lang: Language,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Session date; taken from the file name when omitted",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        date: Option<NaiveDate>,

        #[arg(long, help = "Record identifier; defaults to the file stem")]
        uid: Option<String>,

        #[arg(long, value_name = "FILE", help = "JSON marker set replacing the built-in one")]
        markers: Option<PathBuf>,

        #[arg(long, help = "Drop attendance entries whose name cannot be isolated")]
        drop_unnamed: bool,

        #[arg(long, value_name = "FILE", help = "Write the normalized document to this file")]
        dump_clean: Option<PathBuf>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Parse many documents concurrently and report what was recovered
    Batch {
        #[arg(required = true, help = "Paths of the cleaned HTML documents")]
        files: Vec<PathBuf>,

        #[arg(
            long,
            value_parser = parse_language,
            help = "Language variant of the documents (e, c)"
        )]
        lang: Language,

        #[arg(long, value_name = "FILE", help = "JSON marker set replacing the built-in one")]
        markers: Option<PathBuf>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the JSON schema of a parse result
    Schema,
    /// Print the built-in marker set of a language, as a starting point for --markers
    Markers {
        #[arg(long, value_parser = parse_language, help = "Language variant (e, c)")]
        lang: Language,
    },
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(language: Language, markers: Option<&Path>) -> Arc<LanguageConfig> {
    let Some(path) = markers else {
        let config = LanguageConfig::builtin(language).unwrap_or_else(|e| {
            log::error!("{}", e);
            process::exit(1);
        });
        return Arc::new(config.clone());
    };

    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        log::error!("Error reading marker set {}: {}", path.display(), e);
        process::exit(1);
    });
    let markers = MarkerSet::from_json(&json).unwrap_or_else(|e| {
        log::error!("Error decoding marker set {}: {}", path.display(), e);
        process::exit(1);
    });
    if markers.language != language {
        log::warn!(
            "Marker set is for {} but documents are {}",
            markers.language,
            language
        );
    }
    let config = LanguageConfig::compile(&markers).unwrap_or_else(|e| {
        log::error!("Invalid marker set {}: {}", path.display(), e);
        process::exit(1);
    });
    Arc::new(config)
}

fn file_uid(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, serde::Serialize)]
struct BatchEntry {
    file: String,
    sections: usize,
    questions: usize,
    issues: usize,
    error: Option<String>,
}

fn parse_file(path: &Path, config: &LanguageConfig) -> Result<Hansard, ParseError> {
    let source = fs::read_to_string(path)?;
    let session_date = session_date_from_name(path).unwrap_or_default();
    if session_date.is_empty() {
        log::warn!("No session date in file name {}", path.display());
    }
    Hansard::parse_with_config(
        &file_uid(path),
        &session_date,
        &source,
        config,
        &ParseOptions::default(),
    )
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Parse {
            file,
            lang,
            date,
            uid,
            markers,
            drop_unnamed,
            dump_clean,
            format,
        } => {
            let config = load_config(lang, markers.as_deref());
            let session_date = match date {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => session_date_from_name(&file).unwrap_or_else(|| {
                    log::error!(
                        "No session date given and none found in {}",
                        file.display()
                    );
                    process::exit(1);
                }),
            };
            let uid = uid.unwrap_or_else(|| file_uid(&file));
            let options = ParseOptions {
                missing_name_policy: if drop_unnamed {
                    MissingNamePolicy::Drop
                } else {
                    MissingNamePolicy::KeepFullText
                },
            };

            log::info!("Parsing {}...", file.display());

            let source = fs::read_to_string(&file).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", file.display(), e);
                process::exit(1);
            });
            let hansard =
                Hansard::parse_with_config(&uid, &session_date, &source, &config, &options)
                    .unwrap_or_else(|e| {
                        log::error!("Error parsing {}: {}", file.display(), e);
                        process::exit(1);
                    });

            if let Some(path) = dump_clean {
                match fs::write(&path, hansard.cleaned_html()) {
                    Ok(()) => log::info!("Wrote normalized document to {}", path.display()),
                    Err(e) => log::warn!("Failed to write {}: {}", path.display(), e),
                }
            }

            match format {
                OutputFormat::Json => serialize_json(&hansard),
                OutputFormat::Text => println!("{}", hansard),
            }
        }

        Commands::Batch {
            files,
            lang,
            markers,
            format,
        } => {
            let config = load_config(lang, markers.as_deref());

            log::info!("Parsing {} document(s)...", files.len());

            let mut futures: FuturesUnordered<_> = files
                .into_iter()
                .map(|path| {
                    let config = Arc::clone(&config);
                    async move {
                        let task_path = path.clone();
                        let result =
                            tokio::task::spawn_blocking(move || parse_file(&task_path, &config))
                                .await;
                        (path, result)
                    }
                })
                .collect();

            let mut stats = ParseStats::default();
            let mut entries = Vec::new();
            while let Some((path, joined)) = futures.next().await {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        log::warn!("Parse task for {} failed: {}", path.display(), e);
                        continue;
                    }
                };
                stats.record(&result);
                let entry = match &result {
                    Ok(hansard) => BatchEntry {
                        file: path.display().to_string(),
                        sections: hansard.sections.len(),
                        questions: hansard.questions.len(),
                        issues: hansard.error_count(),
                        error: None,
                    },
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}", path.display(), e);
                        BatchEntry {
                            file: path.display().to_string(),
                            sections: 0,
                            questions: 0,
                            issues: 0,
                            error: Some(e.to_string()),
                        }
                    }
                };
                entries.push(entry);
            }
            entries.sort_by(|a, b| a.file.cmp(&b.file));

            match format {
                OutputFormat::Json => serialize_json(&entries),
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("No documents parsed.");
                    } else {
                        for (i, entry) in entries.iter().enumerate() {
                            match &entry.error {
                                Some(error) => {
                                    println!("{:>3}. {} ✗ {}", i + 1, entry.file, error)
                                }
                                None => println!(
                                    "{:>3}. {} ▸ {} section(s), {} question(s), {} issue(s)",
                                    i + 1,
                                    entry.file,
                                    entry.sections,
                                    entry.questions,
                                    entry.issues
                                ),
                            }
                        }
                        print!("{}", stats);
                    }
                }
            }
        }

        Commands::Schema => serialize_json(&schemars::schema_for!(Hansard)),

        Commands::Markers { lang } => match MarkerSet::builtin(lang) {
            Some(markers) => serialize_json(&markers),
            None => {
                log::error!("No built-in marker set for {} records", lang);
                process::exit(1);
            }
        },
    }
}
