mod commands;
mod display;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quarry_core::research::ReportFormat;
use tracing_subscriber::EnvFilter;

use commands::ResearchArgs;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(version, about = "Autonomous web research agent", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of quarry.toml / ~/.config/quarry/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a topic and print the report
    Research {
        /// The research topic
        #[arg(required = true)]
        topic: Vec<String>,

        /// Skip the clarifying questions
        #[arg(long)]
        no_questions: bool,

        /// Answer to a clarifying question, in question order (repeatable)
        #[arg(short, long = "answer")]
        answers: Vec<String>,

        /// Write the report to this file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format of the written report
        #[arg(long, value_enum, default_value_t = OutputFormat::Md)]
        format: OutputFormat,
    },
    /// Print clarifying questions for a topic
    Questions {
        #[arg(required = true)]
        topic: Vec<String>,
    },
    /// Write a starter quarry.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Serve the research API over HTTP with streamed progress
    Serve {
        #[arg(short, long, default_value_t = 3333)]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Md,
    Txt,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Md => ReportFormat::Markdown,
            OutputFormat::Txt => ReportFormat::Text,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config;
    match cli.command {
        Commands::Research {
            topic,
            no_questions,
            answers,
            output,
            format,
        } => {
            let config = commands::load_config(config_path.as_deref())?;
            let args = ResearchArgs {
                topic: topic.join(" "),
                no_questions,
                answers,
                output,
                format: format.into(),
            };
            commands::research(&config, args).await
        }
        Commands::Questions { topic } => {
            let config = commands::load_config(config_path.as_deref())?;
            commands::questions(&config, &topic.join(" ")).await
        }
        Commands::Init { force } => commands::init(force),
        Commands::Serve { port } => {
            let config = commands::load_config(config_path.as_deref())?;
            serve::start_server(serve::ServeConfig { port }, &config).await
        }
    }
}
