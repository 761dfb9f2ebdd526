//! quizreport CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizreport",
    version,
    about = "Assessment scoring and report generator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate reports for completed attempts
    Generate {
        /// Quiz the attempts belong to
        #[arg(long)]
        quiz: String,

        /// Attempt ids (comma-separated)
        #[arg(long)]
        attempt: String,

        /// Output directory (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: html, svg, view, json, all (default: default_format from config)
        #[arg(long)]
        format: Option<String>,

        /// Max concurrent report fetches
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the achievable marks band of each packet in a quiz
    Marks {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Inspect or save a packet's scoring scale
    Scale {
        #[command(subcommand)]
        action: commands::scale::ScaleAction,

        /// Config file path
        #[arg(long, global = true)]
        config: Option<PathBuf>,
    },

    /// Inspect or edit a quiz's report template
    Template {
        #[command(subcommand)]
        action: commands::template::TemplateAction,

        /// Config file path
        #[arg(long, global = true)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample data
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizreport=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            quiz,
            attempt,
            output,
            format,
            parallelism,
            config,
        } => commands::generate::execute(quiz, attempt, output, format, parallelism, config).await,
        Commands::Marks { quiz, config } => commands::marks::execute(quiz, config).await,
        Commands::Scale { action, config } => commands::scale::execute(action, config).await,
        Commands::Template { action, config } => {
            commands::template::execute(action, config).await
        }
        Commands::Init => commands::init::execute().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
