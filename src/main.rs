use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use merisio::diagram::Diagram;
use merisio::export_execution::{self, ExportFormat};
use merisio::generate_commands;
use merisio::project;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the logical model from a project and render an export
    Export {
        #[clap(short, long)]
        project: String,
        #[clap(short, long, value_enum, default_value = "sql")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[clap(short, long)]
        output: Option<String>,
        /// Re-run the export when the project file changes
        #[clap(short, long)]
        watch: bool,
    },
    /// Check a project for integrity errors and modeling warnings
    Validate {
        #[clap(short, long)]
        project: String,
    },
    /// Write an empty project document
    Init {
        #[clap(short, long)]
        project: String,
    },
    Generate {
        #[clap(subcommand)]
        command: GenerateCommands,
    },
}

#[derive(Subcommand, Debug)]
enum GenerateCommands {
    Template { name: String },
    Sample { dir: String },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Export {
            project,
            format,
            output,
            watch,
        } => {
            info!("Exporting project: {}", project);
            export_execution::run_export(&project, format, output.as_deref(), watch)?;
        }
        Commands::Validate { project } => {
            let diagram = project::load_project(Path::new(&project))?;
            if let Err(errors) = diagram.verify_integrity() {
                for e in &errors {
                    error!("{}", e);
                }
                anyhow::bail!("Project failed {} integrity check(s)", errors.len());
            }
            for warning in diagram.lint() {
                warn!("{}", warning);
            }
            info!("Project is structurally valid ({})", diagram.stats());
        }
        Commands::Init { project } => {
            info!("Initializing project: {}", project);
            let name = Path::new(&project)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled");
            let diagram = Diagram {
                name: name.to_string(),
                ..Diagram::default()
            };
            project::save_project(Path::new(&project), &diagram)?;
        }
        Commands::Generate { command } => match command {
            GenerateCommands::Template { name } => {
                info!("Generating template: {}", name);
                generate_commands::generate_template(name);
            }
            GenerateCommands::Sample { dir } => {
                info!("Generating sample in {}", dir);
                generate_commands::generate_sample(dir);
            }
        },
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("handlebars=off,{}", log_level)))
        .without_time()
        .init();
}
