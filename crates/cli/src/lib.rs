mod languages;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use structscope_api::{AnalysisError, QueryKind};
use structscope_core::format::{self, OutputFormat};
use structscope_core::AnalysisEngine;

#[derive(Parser)]
#[command(
    name = "structscope",
    version,
    about = "Structural inventory of source files for LLM agents",
    long_about = "Structscope parses source files and lists their classes, methods, fields, imports \
                  and other structural elements with exact line ranges, so large files can be \
                  read one element at a time."
)]
pub struct Cli {
    /// Project root. Paths outside it are rejected. Detected from the current
    /// directory when omitted.
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the size of a file and its largest callables
    Scale {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// List the structural elements of a file
    #[command(
        long_about = "Runs one query kind (--query) or every kind the file's language supports \
                            and prints the elements in source order."
    )]
    Analyze {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Query kind, e.g. classes, methods, functions, fields, imports
        #[arg(long, short)]
        query: Option<String>,
        /// Output format: json, csv or table
        #[arg(long, short, default_value = "table")]
        format: OutputFormat,
    },
    /// Print a range of lines (1-based, inclusive)
    Section {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        start: usize,
        end: usize,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// List the supported languages
    Languages,
    /// Start the Model Context Protocol (MCP) server on stdio
    Mcp,
}

/// Process exit status for an error returned by [`run`].
pub fn exit_code(err: &(dyn std::error::Error + 'static)) -> u8 {
    err.downcast_ref::<AnalysisError>()
        .map(|e| e.kind().exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Mcp => "mcp",
        _ => "cli",
    };
    let _guard = structscope_runtime::init_logging(component, false);

    let rt = tokio::runtime::Runtime::new()?;
    let engine = structscope_runtime::open_engine(cli.root.clone())?;

    let output = match cli.command {
        Commands::Scale { path, format } => rt.block_on(async {
            let report = engine.check_scale(resolve(&path)?).await?;
            format::render_scale(&report, format)
        })?,
        Commands::Analyze {
            path,
            query,
            format,
        } => rt.block_on(analyze(&engine, &path, query.as_deref(), format))?,
        Commands::Section {
            path,
            start,
            end,
            format,
        } => rt.block_on(async {
            let section = engine.extract_section(resolve(&path)?, start, end).await?;
            format::render_section(&section, format)
        })?,
        Commands::Languages => languages::render(&engine.list_languages()),
        Commands::Mcp => {
            rt.block_on(structscope_mcp::run_stdio_server(Arc::clone(&engine)))?;
            return Ok(());
        }
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    rt.block_on(engine.shutdown());
    Ok(())
}

async fn analyze(
    engine: &AnalysisEngine,
    path: &Path,
    query: Option<&str>,
    format: OutputFormat,
) -> Result<String, AnalysisError> {
    let kind = query.map(QueryKind::from);
    let report = engine.structure_report(resolve(path)?, kind.as_ref()).await?;
    tracing::debug!("{} elements in {}", report.element_count, report.path);
    format::render(&report, format)
}

/// Command-line paths are relative to the working directory, not the root.
fn resolve(path: &Path) -> Result<PathBuf, AnalysisError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| AnalysisError::io(".", &e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_arguments() {
        let cli = Cli::parse_from([
            "structscope",
            "--root",
            "/proj",
            "analyze",
            "src/A.java",
            "--query",
            "methods",
            "--format",
            "csv",
        ]);
        assert_eq!(cli.root.as_deref(), Some(Path::new("/proj")));
        match cli.command {
            Commands::Analyze {
                path,
                query,
                format,
            } => {
                assert_eq!(path, PathBuf::from("src/A.java"));
                assert_eq!(query.as_deref(), Some("methods"));
                assert_eq!(format, OutputFormat::Csv);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let parsed = Cli::try_parse_from(["structscope", "analyze", "A.java", "--format", "xml"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_exit_code_follows_error_kind() {
        let err: Box<dyn std::error::Error> = Box::new(AnalysisError::EngineShutdown);
        assert_eq!(exit_code(err.as_ref()), 10);
        let err: Box<dyn std::error::Error> = Box::new(AnalysisError::InvalidArgument("x".into()));
        assert_eq!(exit_code(err.as_ref()), 2);
        let err: Box<dyn std::error::Error> = "plain".into();
        assert_eq!(exit_code(err.as_ref()), 1);
    }

    #[tokio::test]
    async fn test_analyze_renders_table() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.java");
        std::fs::write(&file, "class A {\n    void run() {}\n}\n").unwrap();
        let engine = structscope_runtime::open_engine(Some(dir.path().to_path_buf())).unwrap();

        let out = analyze(&engine, &file, Some("methods"), OutputFormat::Table)
            .await
            .unwrap();
        assert!(out.starts_with("A.java (java): 1 elements"));
        assert!(out.contains("run"));
    }

    #[test]
    fn test_languages_table() {
        let registry = structscope_runtime::default_registry();
        let out = languages::render(&registry.list_languages());
        assert!(out.contains(".java"));
        assert!(out.contains(".py .pyi"));
    }
}
