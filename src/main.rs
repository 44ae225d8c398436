//! Console host for the stroke follow-up navigator.
//!
//! `validate` checks a dialogue script; `run` drives an interactive call on
//! stdin/stdout and prints the session summary when it ends. Logs go to
//! stderr so they never mix with the conversation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stroke_navigator::adapters::{JsonFileSummarySink, OllamaConfig, OllamaTextGenerator};
use stroke_navigator::application::{ConversationFlow, FlowSettings};
use stroke_navigator::config::{AppConfig, ConfigError, LoggingConfig};
use stroke_navigator::domain::conversation::ExportError;
use stroke_navigator::domain::dialogue::{DefinitionError, DialogueLoader};
use stroke_navigator::ports::{GenerationError, SinkError};

#[derive(Parser, Debug)]
#[command(name = "stroke-navigator", version)]
#[command(about = "Scripted post-discharge stroke follow-up calls")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "STROKE_NAVIGATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Dialogue script, overriding the configured one
    #[arg(long, global = true)]
    dialogue: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a dialogue script and report structural issues
    Validate,

    /// Run an interactive follow-up call
    Run {
        /// Patient name used in the greeting
        #[arg(long)]
        patient: String,

        #[arg(long, default_value = "Mr.")]
        honorific: String,

        /// Defaults to the configured or scripted organization
        #[arg(long, default_value = "")]
        organization: String,

        /// Defaults to the configured or scripted site
        #[arg(long, default_value = "")]
        site: String,

        /// Summary format printed when the call ends
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Also write the summary as JSON into this directory
        #[arg(long)]
        archive_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Archive(#[from] SinkError),

    #[error("Text generator could not be set up: {0}")]
    Generator(#[from] GenerationError),

    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("Dialogue script has {0} structural issue(s)")]
    StructuralIssues(usize),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);
    tracing::info!(
        name = %config.bot.name,
        version = %config.bot.version,
        "Stroke navigator starting"
    );

    match execute(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "stroke-navigator failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(path) = &cli.dialogue {
        config.conversation.dialogue_path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn execute(cli: Cli, config: AppConfig) -> Result<(), CliError> {
    let definition = DialogueLoader::load_file(&config.conversation.dialogue_path)?;

    match cli.command {
        Command::Validate => {
            let issues = definition.validation_issues();
            println!(
                "{}: {} sections, {} questions",
                config.conversation.dialogue_path.display(),
                definition.sections().len(),
                definition.questions().len()
            );
            for issue in &issues {
                println!("  - {}", issue);
            }
            if issues.is_empty() {
                println!("No structural issues found.");
                Ok(())
            } else {
                Err(CliError::StructuralIssues(issues.len()))
            }
        }
        Command::Run {
            patient,
            honorific,
            organization,
            site,
            format,
            archive_dir,
        } => {
            let organization = first_non_blank(&organization, &config.bot.organization);
            let site = first_non_blank(&site, &config.bot.site);

            let mut flow = ConversationFlow::new(Arc::new(definition), FlowSettings::from(&config));
            if config.generator.enabled {
                let generator = OllamaTextGenerator::new(OllamaConfig::from(&config.generator))?;
                tracing::info!(
                    endpoint = %generator.config().endpoint,
                    model = %generator.config().model,
                    "Routing prompts through text generator"
                );
                flow = flow.with_generator(Arc::new(generator));
            }
            if let Some(dir) = archive_dir {
                flow = flow.with_sink(Arc::new(JsonFileSummarySink::new(dir)));
            }

            println!("{}\n", flow.begin(&patient, &honorific, organization, site).await);
            converse(&mut flow).await?;

            let summary = flow.export_summary();
            let rendered = match format {
                ExportFormat::Json => summary.to_json()?,
                ExportFormat::Csv => summary.to_csv()?,
            };
            println!("{}", rendered);

            if flow.status().over_time_limit {
                tracing::warn!(
                    duration_secs = summary.duration_secs,
                    "Call ran past the configured duration limit"
                );
            }
            match flow.archive().await {
                Ok(_) | Err(SinkError::NotConfigured) => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }
}

/// Reads patient lines until the call ends, stdin closes, or `/quit`.
async fn converse(flow: &mut ConversationFlow) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while flow.status().is_active {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/status" => {
                let status = flow.status();
                println!(
                    "[{} | answers: {} | {}s]\n",
                    status.state, status.responses_count, status.duration_secs
                );
            }
            message => println!("{}\n", flow.submit(message).await),
        }
    }
    Ok(())
}

fn first_non_blank<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.trim().is_empty() {
        fallback
    } else {
        preferred
    }
}
