use crate::McpServer;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use structscope_core::AnalysisEngine;

/// Serves the tools over stdin/stdout until the client disconnects, then
/// shuts the engine down.
pub async fn run_stdio_server(engine: Arc<AnalysisEngine>) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("MCP server starting on stdio for {}", engine.root().display());
    let service = McpServer::new(Arc::clone(&engine)).serve(stdio()).await?;
    service.waiting().await?;
    engine.shutdown().await;
    tracing::info!("MCP server stopped");
    Ok(())
}
