//! MCP (Model Context Protocol) server for the weather service.
//!
//! Exposes `get_weather_by_region` as a tool and the supported-field
//! descriptor as a resource. Runs either as an HTTP server (`/mcp`) or over
//! stdin/stdout.

use crate::fetch::HttpTransport;
use crate::service::WeatherService;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, RoleServer, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// URI of the supported-fields resource.
pub const FIELDS_RESOURCE_URI: &str = "naver://weather/fields";

const FIELDS_RESOURCE_NAME: &str = "supported_fields";

/// Preflight cache lifetime advertised to browsers.
const CORS_MAX_AGE: Duration = Duration::from_secs(86400);

/// Naver weather MCP server. Every session shares one `WeatherService`, so
/// all of them go through the same rate limiter and cache.
pub struct NaverWeatherMcpServer<T: HttpTransport> {
    service: Arc<WeatherService<T>>,
    tool_router: ToolRouter<Self>,
}

impl<T: HttpTransport> Clone for NaverWeatherMcpServer<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            tool_router: self.tool_router.clone(),
        }
    }
}

// ── Tool parameter types ──────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct GetWeatherRequest {
    /// Korean place name (e.g., "서울", "부산 해운대", "제주")
    region: String,
    /// Output format: "text" (default) or "json"
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "text".to_string()
}

// ── Tool implementations ──────────────────────────────────────────

#[tool_router]
impl<T: HttpTransport> NaverWeatherMcpServer<T> {
    pub fn new(service: Arc<WeatherService<T>>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get current weather for a Korean region from Naver search. Returns condition, temperature, feels-like temperature and humidity. format: \"text\" (default) or \"json\".")]
    async fn get_weather_by_region(
        &self,
        Parameters(req): Parameters<GetWeatherRequest>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        log::info!("[MCP] get_weather_by_region region='{}' format='{}'", req.region, req.format);
        let text = self.service.query(&req.region, &req.format).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

// ── Resource helpers ──────────────────────────────────────────────

impl<T: HttpTransport> NaverWeatherMcpServer<T> {
    fn fields_resource() -> Resource {
        let mut raw = RawResource::new(FIELDS_RESOURCE_URI, FIELDS_RESOURCE_NAME);
        raw.description =
            Some("Fields returned by get_weather_by_region plus cache and rate-limit settings".into());
        raw.mime_type = Some("application/json".into());
        raw.no_annotation()
    }

    fn fields_json(&self) -> String {
        serde_json::to_string_pretty(&self.service.supported_fields())
            .unwrap_or_else(|_| "{}".to_string())
    }
}

// ── ServerHandler implementation ──────────────────────────────────

#[tool_handler]
impl<T: HttpTransport> ServerHandler for NaverWeatherMcpServer<T> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Naver weather lookup for Korean regions.\n\
                 get_weather_by_region(region, format): current condition, temperature, \
                 feels-like temperature and humidity. format is \"text\" or \"json\".\n\
                 Resource naver://weather/fields: output fields, cache TTL and rate limit.\n\
                 Results are cached per region; upstream requests are rate limited."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, rmcp::ErrorData> {
        Ok(ListResourcesResult::with_all_items(vec![
            Self::fields_resource(),
        ]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, rmcp::ErrorData> {
        if request.uri != FIELDS_RESOURCE_URI {
            return Err(rmcp::ErrorData::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            ));
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(self.fields_json(), request.uri)],
        })
    }
}

/// Axum router with the MCP service mounted at `/mcp` behind a permissive
/// CORS layer that exposes the MCP session headers to browsers.
pub fn mcp_router<T: HttpTransport>(service: Arc<WeatherService<T>>) -> axum::Router {
    use axum::http::HeaderName;
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    };
    use tower_http::cors::{Any, CorsLayer};

    let mcp_service = StreamableHttpService::new(
        move || Ok(NaverWeatherMcpServer::new(service.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static("mcp-session-id"),
            HeaderName::from_static("mcp-protocol-version"),
        ])
        .max_age(CORS_MAX_AGE);

    axum::Router::new()
        .nest_service("/mcp", mcp_service)
        .layer(cors)
}

/// Start the MCP HTTP server on `0.0.0.0:<port>`.
///
/// Blocks until `shutdown_rx` fires.
pub async fn run_mcp_server<T: HttpTransport>(
    service: Arc<WeatherService<T>>,
    port: u16,
    mut shutdown_rx: tokio::sync::watch::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = mcp_router(service);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("MCP server listening on http://{}/mcp", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
        })
        .await?;

    log::info!("MCP server stopped.");
    Ok(())
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn run_mcp_stdio<T: HttpTransport>(
    service: Arc<WeatherService<T>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use rmcp::ServiceExt;

    let running = NaverWeatherMcpServer::new(service)
        .serve(rmcp::transport::stdio())
        .await?;
    log::info!("MCP stdio server ready");
    let reason = running.waiting().await?;
    log::info!("MCP stdio server stopped: {:?}", reason);
    Ok(())
}
