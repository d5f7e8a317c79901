use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    advisor::DEFAULT_CONTEXT_CHARS,
    config::DEFAULT_MAX_RESULTS,
    error,
    knowledge::KnowledgeBase,
    search::SearchHit,
};

#[derive(Clone)]
pub struct StandardsMcpServer {
    knowledge: Arc<KnowledgeBase>,
    tool_router: ToolRouter<Self>,
}

impl StandardsMcpServer {
    fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge: Arc::new(knowledge),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl StandardsMcpServer {
    /// Context blocks from the AAOIFI standards for a question.
    #[tool(
        name = "standards_context",
        description = "Get page-labelled excerpts from the AAOIFI standards relevant to a question. Returns an empty context when nothing matches or the standards are unavailable."
    )]
    pub async fn standards_context(
        &self,
        params: Parameters<ContextParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let max_chars = params.max_chars.unwrap_or(DEFAULT_CONTEXT_CHARS);
        let knowledge = Arc::clone(&self.knowledge);
        let query = params.query.clone();

        // The first call may load the whole corpus.
        let context = tokio::task::spawn_blocking(move || {
            knowledge.get_relevant_context(&query, max_chars)
        })
        .await
        .map_err(|e| mcp_error("context task failed", e))?;

        let summary = if context.is_empty() {
            format!("No relevant context found for \"{}\"", params.query)
        } else {
            context.clone()
        };
        let structured = serde_json::to_value(ContextResponse {
            query: params.query,
            available: !context.is_empty(),
            context,
        })
        .map_err(|e| mcp_error("failed to serialize context", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }

    /// Ranked chunks of the AAOIFI standards for a query.
    #[tool(
        name = "standards_search",
        description = "Search the AAOIFI standards by keyword. Returns ranked chunks with scores and page labels."
    )]
    pub async fn standards_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let limit = params.limit.unwrap_or(DEFAULT_MAX_RESULTS);
        let knowledge = Arc::clone(&self.knowledge);
        let query = params.query.clone();

        let hits = tokio::task::spawn_blocking(move || {
            knowledge
                .search(&query, limit)
                .map(|ranked| SearchHit::from_ranked(&ranked))
        })
        .await
        .map_err(|e| mcp_error("search task failed", e))?
        .map_err(|e| mcp_error("search failed", e))?;

        let summary = format_search_summary(&hits, &params.query);
        let structured = serde_json::to_value(SearchResponse {
            query: params.query,
            result_count: hits.len(),
            results: hits,
        })
        .map_err(|e| mcp_error("failed to serialize search results", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for StandardsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("aaoifi-kb", env!("CARGO_PKG_VERSION"))
                    .with_title("AAOIFI standards knowledge base"),
            )
            .with_instructions(
                "Use standards_context to ground Islamic finance answers in the AAOIFI standards. Treat an empty context as no reference material, not as an error.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextParams {
    /// The user's question or topic.
    pub query: String,
    /// Character budget for the returned context (default: 2000).
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Search query string.
    pub query: String,
    /// Maximum number of results (default: 5).
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextResponse {
    query: String,
    available: bool,
    context: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    result_count: usize,
    results: Vec<SearchHit>,
}

fn format_search_summary(hits: &[SearchHit], query: &str) -> String {
    if hits.is_empty() {
        return format!("No results found for \"{query}\"");
    }

    let mut lines = Vec::with_capacity(hits.len() + 1);
    let suffix = if hits.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} result{} for \"{query}\":",
        hits.len(),
        suffix
    ));

    for hit in hits {
        lines.push(format!(
            "#{} score {} page {}",
            hit.chunk_index, hit.score, hit.page
        ));
    }

    lines.join("\n")
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(knowledge: KnowledgeBase) -> error::Result<()> {
    let server = StandardsMcpServer::new(knowledge);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataDir, KnowledgeConfig, TEXT_FILE_NAME};

    fn server_with_text(dir: &std::path::Path, text: &str) -> StandardsMcpServer {
        std::fs::write(dir.join(TEXT_FILE_NAME), text).unwrap();
        let data_dir = DataDir::resolve(Some(dir)).unwrap();
        StandardsMcpServer::new(KnowledgeBase::new(KnowledgeConfig::new(
            &data_dir,
        )))
    }

    fn summary(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn context_tool_returns_labelled_blocks() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with_text(
            tmp.path(),
            "--- Page 3 ---\nMurabaha is a sale at cost plus profit.",
        );

        let params = ContextParams {
            query: "murabaha".to_string(),
            max_chars: None,
        };
        let result = server.standards_context(Parameters(params)).await.unwrap();

        let structured = result.structured_content.clone().expect("structured");
        assert_eq!(
            structured.get("available").and_then(|v| v.as_bool()),
            Some(true)
        );
        let context = structured
            .get("context")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        assert!(context.starts_with("[AAOIFI Standards - Page 3]\n"));
        assert_eq!(summary(&result), context);
    }

    #[tokio::test]
    async fn context_tool_reports_missing_context() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let server = StandardsMcpServer::new(KnowledgeBase::new(
            KnowledgeConfig::new(&data_dir),
        ));

        let params = ContextParams {
            query: "riba".to_string(),
            max_chars: Some(500),
        };
        let result = server.standards_context(Parameters(params)).await.unwrap();

        assert_eq!(result.is_error, Some(false));
        assert!(summary(&result).contains("No relevant context"));
    }

    #[tokio::test]
    async fn search_tool_returns_structured_results() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with_text(
            tmp.path(),
            "--- Page 1 ---\nSukuk al-ijarah. Sukuk holders own the asset.",
        );

        let params = SearchParams {
            query: "sukuk".to_string(),
            limit: Some(3),
        };
        let result = server.standards_search(Parameters(params)).await.unwrap();

        let structured = result.structured_content.clone().expect("structured");
        let results = structured
            .get("results")
            .and_then(|v| v.as_array())
            .expect("results array");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("score").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(results[0].get("page").and_then(|v| v.as_str()), Some("1"));
        assert!(summary(&result).contains("Found 1 result"));
    }

    #[tokio::test]
    async fn search_tool_errors_when_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let server = StandardsMcpServer::new(KnowledgeBase::new(
            KnowledgeConfig::new(&data_dir),
        ));

        let params = SearchParams {
            query: "sukuk".to_string(),
            limit: None,
        };
        assert!(server.standards_search(Parameters(params)).await.is_err());
    }
}
