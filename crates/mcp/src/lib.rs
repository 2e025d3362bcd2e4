//! Remote-procedure front end: the engine's capabilities as MCP tools.
//!
//! Paths are project-relative; the engine's security boundary is the only
//! place they are checked.

pub mod stdio;

use rmcp::{
    ErrorData as McpError,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, InitializeResult, ServerCapabilities},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use structscope_api::{AnalysisError, QueryKind};
use structscope_core::format::{self, OutputFormat};
use structscope_core::AnalysisEngine;

pub use stdio::run_stdio_server;

const INSTRUCTIONS: &str = "Structural code analysis. Call check_code_scale first to see how big a \
file is, analyze_code_structure to list its classes, methods, fields and imports with line \
ranges, then extract_code_section to read only the lines you need. File paths are relative to \
the project root.";

#[derive(Clone)]
pub struct McpServer {
    pub(crate) tool_router: ToolRouter<Self>,
    pub(crate) engine: Arc<AnalysisEngine>,
}

#[derive(Deserialize, JsonSchema)]
pub struct ScaleArgs {
    /// Path of the file, relative to the project root
    pub file_path: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct StructureArgs {
    /// Path of the file, relative to the project root
    pub file_path: String,
    /// Optional: one query kind (e.g. "classes", "methods", "fields", "imports").
    /// Every kind the language supports is returned when omitted.
    pub query_kind: Option<String>,
    /// Optional: "json" (default), "csv" or "table"
    pub format: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SectionArgs {
    /// Path of the file, relative to the project root
    pub file_path: String,
    /// First line to return, 1-based
    pub start_line: usize,
    /// Last line to return, inclusive. Clamped to the end of the file.
    pub end_line: usize,
}

#[derive(Deserialize, JsonSchema)]
pub struct ListLanguagesArgs {}

/// Tool result flagged as an error, with a payload clients can branch on.
fn error_result(err: &AnalysisError) -> CallToolResult {
    let kind = err.kind();
    let payload = serde_json::json!({
        "error": kind.as_str(),
        "message": err.to_string(),
        "retryable": kind.is_retryable(),
    });
    tracing::debug!("Tool call failed: {}", err);
    CallToolResult::error(vec![Content::text(payload.to_string())])
}

fn text_result(outcome: Result<String, AnalysisError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => error_result(&e),
    }
}

#[tool_router]
impl McpServer {
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(
        description = "Report the size of a source file: total, code, comment and blank lines, element counts and its largest methods or functions. Call this first to decide whether to read the file whole or in sections."
    )]
    pub async fn check_code_scale(
        &self,
        params: Parameters<ScaleArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let outcome = async {
            let report = self.engine.check_scale(&args.file_path).await?;
            format::render_scale(&report, OutputFormat::Json)
        }
        .await;
        Ok(text_result(outcome))
    }

    #[tool(
        description = "List the structural elements of a source file (classes, methods, functions, fields, imports) with names, modifiers and 1-based line ranges."
    )]
    pub async fn analyze_code_structure(
        &self,
        params: Parameters<StructureArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let outcome = async {
            let format = match args.format.as_deref() {
                Some(f) => f.parse::<OutputFormat>()?,
                None => OutputFormat::Json,
            };
            let kind = args.query_kind.as_deref().map(QueryKind::from);
            let report = self
                .engine
                .structure_report(&args.file_path, kind.as_ref())
                .await?;
            format::render(&report, format)
        }
        .await;
        Ok(text_result(outcome))
    }

    #[tool(
        description = "Return lines start_line..=end_line (1-based, inclusive) of a file. Use the line ranges from analyze_code_structure to read one element at a time."
    )]
    pub async fn extract_code_section(
        &self,
        params: Parameters<SectionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let outcome = async {
            let section = self
                .engine
                .extract_section(&args.file_path, args.start_line, args.end_line)
                .await?;
            format::render_section(&section, OutputFormat::Json)
        }
        .await;
        Ok(text_result(outcome))
    }

    #[tool(description = "List the supported languages with their file extensions and query kinds.")]
    pub async fn list_languages(
        &self,
        _params: Parameters<ListLanguagesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = serde_json::to_string_pretty(&self.engine.list_languages())
            .map_err(|e| AnalysisError::Internal(e.to_string()));
        Ok(text_result(outcome))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for McpServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            server_info: Implementation {
                name: "structscope".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.into()),
        }
    }
}
