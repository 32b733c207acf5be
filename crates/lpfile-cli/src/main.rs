use clap::{Parser, Subcommand};
use lpfile_lang::{ReaderOptions, WriterOptions};
use lpfile_model::{Model, VariableType};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lpfile")]
#[command(about = "Read, check, and rewrite CPLEX LP files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Longest accepted input line, in characters
    #[arg(long, global = true)]
    max_line_length: Option<usize>,

    /// Longest accepted identifier, in characters
    #[arg(long, global = true)]
    max_name_length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an .lp file and print the model
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check an .lp file for errors and summarize its sections
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Rewrite an .lp file in canonical form
    Format {
        /// The file to rewrite
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum output line width
        #[arg(short, long)]
        width: Option<usize>,
    },
}

/// Install a stderr subscriber. `LPFILE_LOG` holds the filter (default
/// `off`), `LPFILE_LOG_FORMAT` picks `pretty` or `json`.
fn init_logging() -> Result<(), String> {
    let level = env::var("LPFILE_LOG").unwrap_or_else(|_| "off".to_string());
    let filter = if level.eq_ignore_ascii_case("off") {
        EnvFilter::default().add_directive(LevelFilter::OFF.into())
    } else {
        EnvFilter::try_new(&level).map_err(|err| format!("Invalid LPFILE_LOG filter: {err}"))?
    };

    let format = env::var("LPFILE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let registry = tracing_subscriber::registry().with(filter);
    let result = if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).json())
            .try_init()
    } else if format.eq_ignore_ascii_case("pretty") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).pretty())
            .try_init()
    } else {
        return Err("Invalid LPFILE_LOG_FORMAT (expected 'json' or 'pretty')".to_string());
    };
    result.map_err(|err| format!("Failed to initialize logging: {err}"))
}

fn load(path: &Path, options: &ReaderOptions) -> Model {
    match lpfile_lang::read_file_with(path, options) {
        Ok(model) => {
            tracing::info!(
                component = "cli",
                operation = "load",
                status = "success",
                path = %path.display(),
                variables = model.num_variables(),
                constraints = model.num_constraints(),
                "Loaded model"
            );
            model
        }
        Err(e) => {
            eprintln!("Error [{}] in {}: {}", e.code(), path.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let mut reader_options = ReaderOptions::default();
    if let Some(max) = cli.max_line_length {
        reader_options = reader_options.with_max_line_length(max);
    }
    if let Some(max) = cli.max_name_length {
        reader_options = reader_options.with_max_name_length(max);
    }

    match cli.command {
        Commands::Parse { file, format } => {
            let model = load(&file, &reader_options);
            if format == "json" {
                match serde_json::to_string_pretty(&model) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing model: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("{:#?}", model);
            }
        }
        Commands::Check { file } => {
            let model = load(&file, &reader_options);
            let count = |var_type| model.variables_of_type(var_type).count();
            let quadratic = model.objective.quad_terms.len()
                + model
                    .constraints
                    .iter()
                    .map(|c| c.expr.quad_terms.len())
                    .sum::<usize>();

            println!("✓ {} is valid", file.display());
            println!();
            println!("Sense:           {:?}", model.sense);
            println!("Variables:       {}", model.num_variables());
            println!("  general:       {}", count(VariableType::General));
            println!("  binary:        {}", count(VariableType::Binary));
            println!("  semi-cont.:    {}", count(VariableType::SemiContinuous));
            println!("Constraints:     {}", model.num_constraints());
            println!("Quadratic terms: {}", quadratic);
        }
        Commands::Format { file, output, width } => {
            let model = load(&file, &reader_options);
            let mut writer_options = WriterOptions::default();
            if let Some(width) = width {
                writer_options = writer_options.with_max_line_width(width);
            }

            let result = match &output {
                Some(path) => lpfile_lang::write_file_with(&model, path, &writer_options),
                None => lpfile_lang::render_with(&model, io::stdout().lock(), &writer_options),
            };
            if let Err(e) = result {
                eprintln!("Error [{}] writing output: {}", e.code(), e);
                std::process::exit(1);
            }
        }
    }
}
