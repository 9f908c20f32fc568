pub mod config;
pub mod content;
pub mod convert;
pub mod detect;
pub mod pipeline;
pub mod summarize;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use config::Config;
use content::DecodedContent;
use detect::TypeTag;
use pipeline::FileInput;
use summarize::{OpenAiSummarizer, Summarizer};

/// Conversion targets the CLI accepts.
const TARGETS: [TypeTag; 7] = [
    TypeTag::Pdf,
    TypeTag::Docx,
    TypeTag::Txt,
    TypeTag::Csv,
    TypeTag::Xlsx,
    TypeTag::Json,
    TypeTag::Yaml,
];

#[derive(Parser)]
#[clap(
    name = "fileconv",
    version,
    about = "Detect, preview, summarise and convert files between formats"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect each file's type and print a content preview
    Inspect {
        /// Files to inspect
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert files to a target format, writing `<stem>_converted.<ext>`
    Convert {
        /// Files to convert
        #[clap(required = true)]
        files: Vec<PathBuf>,
        /// Target format (pdf, docx, txt, csv, xlsx, json, yaml)
        #[clap(long)]
        to: String,
        /// Output directory; defaults to each input file's directory
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },
    /// Summarise a file's text content via the external completion service
    Summarize {
        /// File to summarise
        file: PathBuf,
    },
}

/// CLI logic entrypoint, shared by `main` and the integration tests.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Inspect { files } => run_inspect(&files),
        Commands::Convert { files, to, out_dir } => run_convert(&files, &to, out_dir.as_deref()),
        Commands::Summarize { file } => run_summarize(&file, &config).await,
    }
}

fn run_inspect(paths: &[PathBuf]) -> Result<()> {
    let (inputs, skipped) = load_inputs(paths);
    let files: Vec<FileInput> = inputs.into_iter().map(|(_, f)| f).collect();
    let report = pipeline::inspect_batch(&files);
    for entry in &report.entries {
        println!("== {} [{}]", entry.filename, entry.tag);
        match &entry.outcome {
            Ok(content) => println!("{}", pipeline::render_preview(content)),
            Err(e) => println!("error: {e}"),
        }
        println!();
    }
    if skipped > 0 {
        bail!("{skipped} of {} input files could not be read", paths.len());
    }
    Ok(())
}

fn run_convert(paths: &[PathBuf], to: &str, out_dir: Option<&std::path::Path>) -> Result<()> {
    let target = parse_target(to)?;
    let (files, skipped) = load_inputs(paths);
    // Unreadable inputs already printed their error; they still count as
    // failed conversions.
    let mut failed = skipped;

    // Convert one file at a time so the default output directory follows each
    // input file.
    for (path, file) in &files {
        let dir = out_dir
            .map(|d| d.to_path_buf())
            .or_else(|| path.parent().map(|p| p.to_path_buf()))
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        let report = pipeline::convert_batch(std::slice::from_ref(file), target, &dir);
        for entry in report.entries {
            match entry.outcome {
                Ok(converted) => println!(
                    "{} [{}] -> {} ({}, {} bytes)",
                    entry.filename,
                    entry.tag,
                    converted.path.display(),
                    converted.mime,
                    converted.size
                ),
                Err(e) => {
                    failed += 1;
                    println!("{} [{}] -> error: {e}", entry.filename, entry.tag);
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} conversions failed", paths.len());
    }
    Ok(())
}

async fn run_summarize(path: &std::path::Path, config: &Config) -> Result<()> {
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tag = detect::detect(&data, &filename);
    let content = content::read(&data, tag)?;

    let kind = content.kind();
    let DecodedContent::Text(text) = content else {
        println!("No text content to summarise ({filename} decodes to {kind}).");
        return Ok(());
    };

    let summarizer = match &config.api_base {
        Some(base) => OpenAiSummarizer::with_api_base(config.api_key.clone(), base.clone()),
        None => OpenAiSummarizer::new(config.api_key.clone()),
    };
    match summarizer.summarize(&text).await {
        Some(summary) => println!("{summary}"),
        None => println!("No summary available."),
    }
    Ok(())
}

/// Read each input file; unreadable paths are reported and skipped so sibling
/// files still process. The second value counts the skipped paths so callers
/// can reflect them in the exit code.
fn load_inputs(paths: &[PathBuf]) -> (Vec<(PathBuf, FileInput)>, usize) {
    let mut files = Vec::with_capacity(paths.len());
    let mut skipped = 0usize;
    for path in paths {
        match std::fs::read(path) {
            Ok(data) => files.push((
                path.clone(),
                FileInput {
                    filename: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                    data,
                },
            )),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read input file");
                println!("{}: error: {e}", path.display());
                skipped += 1;
            }
        }
    }
    (files, skipped)
}

fn parse_target(to: &str) -> Result<TypeTag> {
    let requested = TypeTag::from_extension(&to.to_lowercase());
    match requested {
        Some(tag) if TARGETS.contains(&tag) => Ok(tag),
        _ => {
            let supported: Vec<&str> = TARGETS.iter().map(|t| t.extension()).collect();
            bail!(
                "unsupported target format '{to}' (supported: {})",
                supported.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parsing_accepts_output_formats_only() {
        assert_eq!(parse_target("json").unwrap(), TypeTag::Json);
        assert_eq!(parse_target("PDF").unwrap(), TypeTag::Pdf);
        assert_eq!(parse_target("yml").unwrap(), TypeTag::Yaml);
        assert!(parse_target("png").is_err());
        assert!(parse_target("nonsense").is_err());
    }
}
