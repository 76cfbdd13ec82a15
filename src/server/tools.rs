use std::sync::Arc;
use rmcp::model::{AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult, PaginatedRequestParam, ProtocolVersion, RawResource, Resource, ServerCapabilities, ServerInfo};
use serde_json::json;
use serde::Deserialize;

use rmcp::{
    Error as McpError, RoleServer, ServerHandler, model::*, schemars,
    service::RequestContext, tool,
};

use crate::export::{ExportService, PAGE_NOT_FOUND, PageText};
use crate::slug::SlugResolver;
use crate::source::ContentDir;

const TOC_URI: &str = "docs://llms.txt";
const FULL_URI: &str = "docs://llms-full.txt";

type Export = Arc<ExportService<ContentDir>>;

#[derive(Clone)]
pub struct DocsServer {
    pub export: Export,
    resolver: SlugResolver,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DocsPageRequest {
    #[schemars(description = "page slug, e.g. 'quick-start/setting-up-playroomkit'")]
    #[serde(alias = "slug")]
    pub page: String,
}

#[tool(tool_box)]
impl DocsServer {

    pub fn new(export: Export, resolver: SlugResolver) -> Self {
        Self {
            export,
            resolver,
        }
    }

    fn resource(&self, uri: &str, name: &str) -> Resource {
        RawResource::new(uri, name.to_string()).no_annotation()
    }

    async fn full_corpus(&self) -> Result<String, McpError> {
        self.export.get_full_corpus().await.map_err(|e| {
            tracing::error!("Failed to export documentation: {:#}", e);
            McpError::internal_error(format!("{:#}", e), None)
        })
    }

    #[tool(description = "Returns a markdown table of contents for the documentation")]
    async fn docs_toc(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            self.export.get_table_of_contents(),
        )]))
    }

    #[tool(description = "Returns a single page's documentation (slug like 'quick-start/setting-up-playroomkit')")]
    async fn docs_page(
        &self,
        #[tool(aggr)] DocsPageRequest { page }: DocsPageRequest,
    ) -> Result<CallToolResult, McpError> {
        if page.trim().is_empty() {
            return Err(McpError::invalid_params("page must not be empty", Some(json!({ "page": page }))));
        }

        let slug = self.resolver.resolve("", Some(&page));
        match self.export.get_page(&slug).await {
            Ok(PageText::Found(text)) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Ok(PageText::NotFound) => {
                tracing::info!("docs_page: no page for '{}'", page);
                Ok(CallToolResult::error(vec![Content::text(PAGE_NOT_FOUND)]))
            }
            Err(e) => {
                tracing::error!("docs_page: failed to load '{}': {:#}", page, e);
                Err(McpError::internal_error(format!("{:#}", e), None))
            }
        }
    }

    #[tool(description = "Returns the entire documentation corpus as plain text")]
    async fn docs_full(&self) -> Result<CallToolResult, McpError> {
        let corpus = self.full_corpus().await?;
        Ok(CallToolResult::success(vec![Content::text(corpus)]))
    }
}


#[tool(tool_box)]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some("This server provides the documentation as plain text. Use 'docs_toc' for a table of contents, 'docs_page' to fetch one page by slug, or 'docs_full' for the whole corpus.".to_string()),
        }
    }

    async fn list_resources(
        &self,
        _request: PaginatedRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: vec![
                self.resource(TOC_URI, "llms.txt"),
                self.resource(FULL_URI, "llms-full.txt"),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match uri.as_str() {
            TOC_URI => {
                let toc = self.export.get_table_of_contents();
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(toc, uri)],
                })
            }
            FULL_URI => {
                let corpus = self.full_corpus().await?;
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(corpus, uri)],
                })
            }
            _ => Err(McpError::resource_not_found(
                "resource_not_found",
                Some(json!({
                    "uri": uri
                })),
            )),
        }
    }

    async fn list_resource_templates(
        &self,
        _request: PaginatedRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: Vec::new(),
        })
    }
}
