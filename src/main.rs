use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;

use docx_stylist::classify::{DelegatedClassifier, Label};
use docx_stylist::config::{init_default_config, Credential, StylistConfig};
use docx_stylist::format::{default_output_path, format_document};
use docx_stylist::report::{
    classification_report, process_document, summarize_document, SummaryReport,
};

#[derive(Parser, Debug)]
#[command(name = "docx-stylist")]
#[command(about = "Classify DOCX paragraphs and restyle them (rule-based or LLM-assisted)", long_about = None)]
struct Args {
    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Config file path (default: DOCX_STYLIST_CONFIG, then search for docx-stylist.toml upwards)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restyle a document and write the formatted copy
    Format {
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        /// Output .docx (default: <dir>/formatted_<name>)
        #[arg(short, long, value_name = "DOCX")]
        output: Option<PathBuf>,

        /// Ask the LLM for labels; falls back to rules when unavailable
        #[arg(long)]
        use_llm: bool,

        /// JSON array of labels, one per non-empty paragraph
        #[arg(long, value_name = "JSON")]
        labels: Option<PathBuf>,
    },
    /// LLM paragraph labels as JSON (no formatting)
    Classify {
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(long, value_name = "JSON")]
        json: Option<PathBuf>,
    },
    /// 1-2 sentence LLM summary as JSON
    Summarize {
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        #[arg(long, value_name = "JSON")]
        json: Option<PathBuf>,
    },
    /// Classify, format with those labels and summarize in one go
    Process {
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        #[arg(short, long, value_name = "DOCX")]
        output: Option<PathBuf>,

        #[arg(long, value_name = "JSON")]
        json: Option<PathBuf>,
    },
}

impl Command {
    fn input(&self) -> &Path {
        match self {
            Command::Format { input, .. }
            | Command::Classify { input, .. }
            | Command::Summarize { input, .. }
            | Command::Process { input, .. } => input,
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize json")?;
    match path {
        Some(p) => {
            std::fs::write(p, text).with_context(|| format!("write json: {}", p.display()))?;
            eprintln!("Wrote {}", p.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn read_labels(path: &Path) -> anyhow::Result<Vec<Label>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read labels: {}", path.display()))?;
    let raw: Vec<String> =
        serde_json::from_str(&text).with_context(|| format!("parse labels: {}", path.display()))?;
    Ok(raw.iter().map(|s| Label::parse_lenient(s)).collect())
}

fn require_available(delegated: &DelegatedClassifier) -> anyhow::Result<()> {
    if delegated.is_available() {
        Ok(())
    } else {
        Err(anyhow!(
            "LLM unavailable: set GEMINI_API_KEY or GOOGLE_API_KEY (or [oracle].api_key_env)"
        ))
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let Some(command) = args.command else {
        let mut cmd = Args::command();
        cmd.print_help().context("print help")?;
        eprintln!(
            "\n\nUSAGE:\n  docx-stylist format <input.docx> [--use-llm]\n\nTIPS:\n  - Default config search: docx-stylist.toml (upwards), or set DOCX_STYLIST_CONFIG.\n  - LLM modes read the API key from GEMINI_API_KEY or GOOGLE_API_KEY.\n"
        );
        return Ok(());
    };

    let workdir = command
        .input()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let settings = StylistConfig::from_sources(args.config, &workdir).context("build config")?;
    let credential = Credential::discover(&settings.api_key_env);
    let delegated = settings.delegated_classifier(credential.as_ref())?;

    match command {
        Command::Format {
            input,
            output,
            use_llm,
            labels,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input, &settings.output_prefix));
            let precomputed = labels.as_deref().map(read_labels).transpose()?;
            let summary =
                format_document(&input, &output, use_llm, precomputed.as_deref(), &delegated)?;
            eprintln!(
                "Wrote {} ({} paragraphs, labels: {})",
                summary.output.display(),
                summary.labels.len(),
                summary.source.as_str()
            );
        }
        Command::Classify { input, json } => {
            let report = classification_report(&input, &delegated)?;
            emit_json(&report, json.as_deref())?;
        }
        Command::Summarize { input, json } => {
            require_available(&delegated)?;
            let summary = summarize_document(&input, &delegated)?
                .ok_or_else(|| anyhow!("LLM summary unavailable"))?;
            emit_json(&SummaryReport { summary }, json.as_deref())?;
        }
        Command::Process {
            input,
            output,
            json,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input, &settings.output_prefix));
            let outcome = process_document(&input, &output, &delegated)?;
            emit_json(&outcome, json.as_deref())?;
        }
    }
    Ok(())
}
