//! Command-line interface for the ingestion pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use citycode_ingest::builder::MentionAssignment;
use citycode_ingest::extraction::{AnthropicExtractor, ExtractionConfig};
use citycode_ingest::observe::{PipelineEvent, PipelineObserver, TracingObserver};
use citycode_ingest::{Jurisdiction, Pipeline, PipelineOutput};

use crate::error::Result;
use crate::input::{load_layout, load_lines};
use crate::output::{write_artifacts, WrittenArtifacts};

/// City Code Ingest - Structure municipal code documents into payloads.
#[derive(Parser)]
#[command(name = "citycode-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline over a text file and write JSON artifacts.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Normalized document text, one line per line
    #[arg(long)]
    pub lines: PathBuf,

    /// Page/block layout (.json, .yaml or .yml); one page of lines if omitted
    #[arg(long)]
    pub layout: Option<PathBuf>,

    #[arg(long, default_value = "San Jose")]
    pub city: String,

    #[arg(long, default_value = "CA")]
    pub state: String,

    /// Code version label
    #[arg(long = "code-version", default_value = "2025-01")]
    pub version: String,

    /// URL of the source document
    #[arg(long, default_value = "")]
    pub source_url: String,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Catalog through the structured-extraction service (reads LLM_* env vars)
    #[arg(long)]
    pub use_llm: bool,

    /// How decision points are placed on sections
    #[arg(long, value_enum, default_value_t = Assignment::RoundRobin)]
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Assignment {
    /// Point i goes to section i mod n
    RoundRobin,
    /// First section mentioning the requirement id, else round-robin
    Mention,
}

/// Updates the spinner on stage completion and forwards every event to tracing.
struct SpinnerObserver<'a> {
    pb: &'a ProgressBar,
}

impl PipelineObserver for SpinnerObserver<'_> {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        if let PipelineEvent::StageFinished { stage, .. } = event {
            self.pb.set_message(format!("Finished {}...", stage.as_str()));
        }
        TracingObserver.on_event(event);
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(&args),
    }
}

fn structured_extractor(use_llm: bool) -> Option<AnthropicExtractor> {
    if !use_llm {
        return None;
    }
    let extractor = ExtractionConfig::from_env().and_then(|config| AnthropicExtractor::new(&config));
    match extractor {
        Ok(extractor) => Some(extractor),
        Err(e) => {
            tracing::warn!(error = %e, "Structured extraction unavailable");
            println!(
                "{} structured extraction unavailable ({e}); using regex catalog",
                style("Warning:").yellow().bold()
            );
            None
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("code")
        .to_string()
}

/// Execute the run command.
pub fn run_command(args: &RunArgs) -> Result<()> {
    let lines = load_lines(&args.lines)?;
    let layout = load_layout(args.layout.as_deref(), &lines)?;
    let jurisdiction = Jurisdiction::new(&args.city, &args.state, &args.version)
        .with_source_url(&args.source_url);

    println!(
        "{} {} for {}, {}",
        style("Ingesting").bold(),
        style(args.lines.display()).cyan(),
        style(&jurisdiction.city).green(),
        style(&jurisdiction.state).green()
    );
    println!();

    let extractor = structured_extractor(args.use_llm);

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Segmenting sections...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let observer = SpinnerObserver { pb: &pb };
    let mut pipeline = Pipeline::new().with_observer(&observer);
    if let Some(extractor) = extractor.as_ref() {
        pipeline = pipeline.with_extractor(extractor);
    }
    if args.assignment == Assignment::Mention {
        pipeline = pipeline.with_assignment(MentionAssignment);
    }

    let output = match pipeline.run(&lines, &layout, &jurisdiction) {
        Ok(output) => output,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    pb.set_message("Writing artifacts...");
    let written = match write_artifacts(&output, &args.output_dir, &file_stem(&args.lines)) {
        Ok(written) => written,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();
    print_summary(&output, &written);

    Ok(())
}

fn print_summary(output: &PipelineOutput, written: &WrittenArtifacts) {
    println!("  Sections: {}", output.sections.len());
    println!(
        "  Catalog: {} RAD, {} PO, {} EAD",
        output.catalog.requirements.len(),
        output.catalog.outcomes.len(),
        output.catalog.evidence.len()
    );
    println!("  Decision points: {}", output.decision_points.len());
    if output.report.is_ok() {
        println!("  Validation: {}", style("ok").green());
    } else {
        let issues = &output.report.issues;
        println!(
            "  Validation: {} ({} missing links, {} dangling refs, {} span conflicts, {} duplicate ids)",
            style("issues detected").yellow().bold(),
            issues.missing_links.len(),
            issues.dangling_refs.len(),
            issues.span_conflicts.len(),
            issues.duplicate_ids.len()
        );
    }

    println!();
    println!("{}", style("Wrote:").green().bold());
    for path in written.iter() {
        println!("  {}", path.display());
    }
}
