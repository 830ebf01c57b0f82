use std::{net::SocketAddr, sync::Arc};

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request},
	middleware::{self, Next},
	response::IntoResponse,
};
use color_eyre::Result;
use rmcp::{
	ErrorData, RoleServer, ServerHandler,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	service::RequestContext,
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::McpAuthState;
use shortcut_providers::{Entity, ShortcutClient};
use shortcut_query::{
	CancellationToken, Catalog, Compiler, Error as QueryError, QueryParams, ValueKind,
};

const HEADER_AUTHORIZATION: &str = "Authorization";
const DATE_DESCRIPTION: &str = "A YYYY-MM-DD date, today, yesterday or tomorrow. Ranges use START..END and either bound may be omitted.";
const USER_DESCRIPTION: &str = "A mention name, or \"me\" for the member that owns the API token.";

#[derive(Clone, Debug)]
pub struct SearchSettings {
	pub page_size: u32,
	pub detail: String,
}

#[derive(Clone)]
struct ShortcutMcp {
	client: ShortcutClient,
	search: SearchSettings,
	tool_router: ToolRouter<Self>,
}
impl ShortcutMcp {
	fn new(client: ShortcutClient, search: SearchSettings) -> Self {
		Self { client, search, tool_router: Self::tool_router() }
	}

	async fn run_search(
		&self,
		entity: Entity,
		catalog: &Catalog,
		raw: JsonObject,
		cancel: &CancellationToken,
	) -> Result<CallToolResult, ErrorData> {
		let params = QueryParams::from_json(catalog, &raw).map_err(query_error)?;

		if params.is_empty() {
			return Err(ErrorData::invalid_params("At least one filter is required.", None));
		}

		let query =
			Compiler::new(catalog, &self.client).compile(&params, cancel).await.map_err(query_error)?;
		let page = self
			.client
			.search(entity, &query, self.search.page_size, &self.search.detail)
			.await
			.map_err(|err| {
				ErrorData::internal_error(format!("Shortcut search request failed: {err}"), None)
			})?;

		Ok(CallToolResult::structured(serde_json::json!({
			"entity": entity.as_str(),
			"query": query,
			"total": page.total,
			"shown": page.items.len(),
			"items": page.items,
			"next": page.next,
		})))
	}
}

#[rmcp::tool_router]
impl ShortcutMcp {
	#[rmcp::tool(
		name = "stories_search",
		description = "Find Shortcut stories matching the given filters. Flags set to false exclude matches.",
		input_schema = stories_search_schema()
	)]
	async fn stories_search(
		&self,
		params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		self.run_search(Entity::Stories, Catalog::stories(), params, &context.ct).await
	}

	#[rmcp::tool(
		name = "epics_search",
		description = "Find Shortcut epics matching the given filters. Flags set to false exclude matches.",
		input_schema = epics_search_schema()
	)]
	async fn epics_search(
		&self,
		params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		self.run_search(Entity::Epics, Catalog::epics(), params, &context.ct).await
	}
}

#[rmcp::tool_handler]
impl ServerHandler for ShortcutMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Searches Shortcut stories and epics. Filters compile into Shortcut search syntax."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_mcp(
	bind_addr: &str,
	client: ShortcutClient,
	search: SearchSettings,
	auth_state: McpAuthState,
) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let service = StreamableHttpService::new(
		move || Ok(ShortcutMcp::new(client.clone(), search.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new()
		.fallback_service(service)
		.layer(middleware::from_fn_with_state(auth_state, mcp_auth_middleware));
	let listener = TcpListener::bind(bind_addr).await?;

	axum::serve(listener, router).await?;

	Ok(())
}

fn query_error(err: QueryError) -> ErrorData {
	match err {
		QueryError::UnknownField { .. } | QueryError::InvalidValue { .. } =>
			ErrorData::invalid_params(err.to_string(), None),
		QueryError::Resolution { .. } | QueryError::Cancelled { .. } => {
			tracing::warn!(field = err.key(), error = %err, "Search query compilation failed.");

			ErrorData::internal_error(err.to_string(), None)
		},
	}
}

fn stories_search_schema() -> Arc<JsonObject> {
	Arc::new(catalog_schema(Catalog::stories()))
}

fn epics_search_schema() -> Arc<JsonObject> {
	Arc::new(catalog_schema(Catalog::epics()))
}

fn catalog_schema(catalog: &Catalog) -> JsonObject {
	let mut properties = JsonObject::new();

	for field in catalog.fields() {
		properties.insert(field.key.to_string(), field_schema(field.kind));
	}

	let mut schema = JsonObject::new();

	schema.insert("type".to_string(), Value::from("object"));
	schema.insert("additionalProperties".to_string(), Value::Bool(false));
	schema.insert("properties".to_string(), Value::Object(properties));

	schema
}

fn field_schema(kind: ValueKind) -> Value {
	match kind {
		ValueKind::String => serde_json::json!({ "type": ["string", "null"] }),
		ValueKind::Number => serde_json::json!({ "type": ["integer", "null"] }),
		ValueKind::Enum(allowed) => {
			let mut values: Vec<Value> = allowed.iter().map(|value| Value::from(*value)).collect();

			values.push(Value::Null);

			serde_json::json!({ "type": ["string", "null"], "enum": values })
		},
		ValueKind::BooleanIs(label) => serde_json::json!({
			"type": ["boolean", "null"],
			"description": format!("true matches is:{label}, false excludes it."),
		}),
		ValueKind::BooleanHas(label) => serde_json::json!({
			"type": ["boolean", "null"],
			"description": format!("true matches has:{label}, false excludes it."),
		}),
		ValueKind::Date =>
			serde_json::json!({ "type": ["string", "null"], "description": DATE_DESCRIPTION }),
		ValueKind::UserRef =>
			serde_json::json!({ "type": ["string", "null"], "description": USER_DESCRIPTION }),
	}
}

fn is_authorized(headers: &HeaderMap, auth_state: &McpAuthState) -> bool {
	match auth_state {
		McpAuthState::Off => true,
		McpAuthState::StaticToken { bearer_token } =>
			read_bearer_token(headers).is_some_and(|token| token == bearer_token),
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

async fn mcp_auth_middleware(
	State(auth_state): State<McpAuthState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &auth_state) {
		return (
			axum::http::StatusCode::UNAUTHORIZED,
			"Authentication required for security.auth_mode=static_token with a Bearer token.",
		)
			.into_response();
	}

	next.run(req).await
}
