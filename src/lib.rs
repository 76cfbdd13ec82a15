//! # Playdocs
//!
//! Machine-readable exports of a game SDK documentation site, served over
//! HTTP (`llms.txt` / `llms-full.txt`) and as Model Context Protocol (MCP)
//! tools, plus the query parameter state synchronization used by the docs
//! front end.
//!
//! ## Modules
//!
//! - `slug`: request path and `?slug=` normalization
//! - `document`: pages and frontmatter handling
//! - `source`: page index and content loading
//! - `export`: table of contents, single page and full corpus exports
//! - `params`: query parameter state store (URL, memory, durable storage)
//! - `storage`: durable key-value storage
//! - `server`: MCP server implementation and tools
//! - `http`: HTTP export routes

/// Slug resolution
pub mod slug;
/// Pages and frontmatter
pub mod document;
/// Content providers
pub mod source;
/// Plain-text exports
pub mod export;
/// Query parameter state store
pub mod params;
/// Durable key-value storage
pub mod storage;
/// Server implementation and MCP tools
pub mod server;
/// HTTP export routes
pub mod http;
