use std::sync::Arc;
use std::time::Instant;

use rmcp::{ErrorData as McpError, ServerHandler, model::*};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    app::{registry::ToolRegistry, validate},
    domain::dispatch::DispatchRun,
    infra::metrics,
    shared::types::{DispatchTrace, FailureKind, FieldFault},
};

/// Protocol gateway: resolves, validates, invokes, and translates outcomes.
/// Every underlying failure is converted to a structured result here; nothing
/// escapes a single request.
#[derive(Clone)]
pub struct OwuiMcpServer {
    registry: Arc<ToolRegistry>,
}

impl OwuiMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        let mut run = DispatchRun::new();
        let started_at = OffsetDateTime::now_utc();
        let timer = Instant::now();
        let _inflight = metrics::InflightGuard::new();
        metrics::TOOL_CALLS.inc();

        let Some(entry) = self.registry.resolve(name) else {
            run.fail();
            tracing::warn!(tool = name, "unknown tool requested");
            return self.failure(
                &run,
                name,
                started_at,
                &timer,
                FailureKind::ToolNotFound,
                format!("unknown tool: {name}"),
                None,
            );
        };
        run.resolve();

        let arguments = match validate::validate_arguments(&entry.params, arguments) {
            Ok(validated) => validated,
            Err(faults) => {
                run.fail();
                let named: Vec<&str> = faults.iter().map(|f| f.field.as_str()).collect();
                tracing::warn!(tool = name, fields = ?named, "argument validation failed");
                return self.failure(
                    &run,
                    name,
                    started_at,
                    &timer,
                    FailureKind::InvalidArguments,
                    format!("invalid arguments: {}", named.join(", ")),
                    Some(faults),
                );
            }
        };
        run.validate();

        run.invoke();
        match (entry.invoke)(Value::Object(arguments)).await {
            Ok(value) => {
                run.complete();
                let duration_ms = timer.elapsed().as_millis() as u64;
                metrics::DISPATCH_LATENCY.observe(duration_ms as f64);
                tracing::info!(tool = name, duration_ms, "tool invocation succeeded");
                let mut result = CallToolResult::structured(value);
                Self::attach_trace(&mut result, &trace(&run, name, started_at, duration_ms));
                result
            }
            Err(err) => {
                run.fail();
                let kind = FailureKind::from_client_error(&err);
                tracing::warn!(tool = name, kind = kind.as_str(), error = %err, "tool invocation failed");
                self.failure(&run, name, started_at, &timer, kind, err.to_string(), None)
            }
        }
    }

    fn failure(
        &self,
        run: &DispatchRun,
        tool: &str,
        started_at: OffsetDateTime,
        timer: &Instant,
        kind: FailureKind,
        message: String,
        fields: Option<Vec<FieldFault>>,
    ) -> CallToolResult {
        metrics::record_failure(kind.as_str());
        let mut error = json!({
            "kind": kind.as_str(),
            "message": message,
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }
        let mut result = CallToolResult::structured_error(json!({ "error": error }));
        let duration_ms = timer.elapsed().as_millis() as u64;
        Self::attach_trace(&mut result, &trace(run, tool, started_at, duration_ms));
        result
    }

    fn attach_trace(result: &mut CallToolResult, trace: &DispatchTrace) {
        match serde_json::to_value(trace) {
            Ok(value) => {
                let mut meta = result.meta.take().unwrap_or_else(Meta::new);
                meta.insert("trace".into(), value);
                result.meta = Some(meta);
            }
            Err(err) => {
                tracing::error!(%err, "failed to serialize dispatch trace");
            }
        }
    }
}

fn trace(
    run: &DispatchRun,
    tool: &str,
    started_at: OffsetDateTime,
    duration_ms: u64,
) -> DispatchTrace {
    DispatchTrace {
        request_id: run.id,
        tool_name: tool.to_string(),
        state: run.state.as_str().to_string(),
        started_at: started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".into()),
        duration_ms,
    }
}

impl ServerHandler for OwuiMcpServer {
    fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<InitializeResult, McpError>> + Send + '_ {
        tracing::info!(?request.client_info, %request.protocol_version, "initialize received");
        let capabilities = ServerCapabilities::builder().enable_tools().build();
        let init = ServerInfo {
            // echo back the protocol requested by client for compatibility
            protocol_version: request.protocol_version,
            capabilities,
            server_info: Implementation {
                name: "owui-mcp".into(),
                title: Some("Open WebUI MCP".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: None,
        };
        async move { Ok(init) }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.registry.list();
        tracing::info!(count = tools.len(), "list_tools called");
        async move {
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let this = self.clone();
        async move {
            tracing::info!(tool = %request.name, "call_tool received");
            let arguments = request.arguments.unwrap_or_default();
            Ok(this.dispatch(request.name.as_ref(), arguments).await)
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "owui-mcp".into(),
                title: Some("Open WebUI MCP".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::discovery;
    use owui_client::ClientError;
    use owui_client::surface::{FieldSpec, OperationDef, Resource, TypeShape};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SpyRouter {
        calls: Arc<AtomicUsize>,
    }

    impl Resource for SpyRouter {
        fn name(&self) -> &'static str {
            "spy"
        }

        fn operations(&self) -> Vec<OperationDef> {
            vec![
                OperationDef::new("record", "Echo the validated arguments.")
                    .param(FieldSpec::required("a", TypeShape::Integer))
                    .param(FieldSpec::with_default("b", TypeShape::String, json!("x")))
                    .handler({
                        let calls = self.calls.clone();
                        move |args| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Box::pin(async move { Ok(json!({"echo": args})) })
                        }
                    }),
                OperationDef::new("explode", "Always fails with a remote 404.").handler(|_| {
                    Box::pin(async {
                        Err(ClientError::NotFound {
                            message: "no such chat".into(),
                        })
                    })
                }),
            ]
        }
    }

    fn gateway(calls: &Arc<AtomicUsize>) -> OwuiMcpServer {
        let spy = SpyRouter {
            calls: calls.clone(),
        };
        let routers = discovery::discover_resources(&[&spy]).expect("discover");
        let registry = ToolRegistry::build(routers).expect("registry");
        OwuiMcpServer::new(Arc::new(registry))
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().expect("object args")
    }

    fn error_of(result: &CallToolResult) -> Value {
        result
            .structured_content
            .as_ref()
            .expect("structured content")
            .get("error")
            .cloned()
            .expect("error payload")
    }

    #[tokio::test]
    async fn unknown_tool_is_a_structured_failure_and_dispatch_survives() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server.dispatch("spy__missing", args(json!({}))).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(error_of(&result)["kind"], json!("tool_not_found"));

        let ok = server.dispatch("spy__record", args(json!({"a": 1}))).await;
        assert_ne!(ok.is_error, Some(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_required_field_short_circuits_before_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server.dispatch("spy__record", args(json!({"b": "y"}))).await;
        assert_eq!(result.is_error, Some(true));
        let error = error_of(&result);
        assert_eq!(error["kind"], json!("invalid_arguments"));
        assert_eq!(error["fields"][0]["field"], json!("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_extra_fields_are_rejected_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server
            .dispatch("spy__record", args(json!({"a": 1, "stray": true})))
            .await;
        let error = error_of(&result);
        assert_eq!(error["kind"], json!("invalid_arguments"));
        assert_eq!(error["fields"][0]["field"], json!("stray"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn declared_defaults_reach_the_underlying_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server.dispatch("spy__record", args(json!({"a": 5}))).await;
        assert_ne!(result.is_error, Some(true));
        let payload = result.structured_content.expect("structured content");
        assert_eq!(payload["echo"]["a"], json!(5));
        assert_eq!(payload["echo"]["b"], json!("x"));
    }

    #[tokio::test]
    async fn remote_failures_become_tagged_results_and_later_calls_succeed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server.dispatch("spy__explode", args(json!({}))).await;
        assert_eq!(result.is_error, Some(true));
        let error = error_of(&result);
        assert_eq!(error["kind"], json!("not_found"));
        assert!(error["message"].as_str().unwrap().contains("no such chat"));

        let ok = server.dispatch("spy__record", args(json!({"a": 2}))).await;
        assert_ne!(ok.is_error, Some(true));
    }

    #[tokio::test]
    async fn results_carry_a_dispatch_trace() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);

        let result = server.dispatch("spy__record", args(json!({"a": 1}))).await;
        let meta = result.meta.expect("meta");
        let trace = meta.get("trace").expect("trace entry");
        assert_eq!(trace["tool_name"], json!("spy__record"));
        assert_eq!(trace["state"], json!("completed"));

        let failed = server.dispatch("spy__explode", args(json!({}))).await;
        let meta = failed.meta.expect("meta");
        assert_eq!(meta.get("trace").unwrap()["state"], json!("failed"));
    }

    #[test]
    fn listings_are_identical_across_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let server = gateway(&calls);
        let first: Vec<String> = server.registry().list().iter().map(|t| t.name.to_string()).collect();
        let second: Vec<String> = server.registry().list().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(first, vec!["spy__explode", "spy__record"]);
        assert_eq!(first, second);
    }
}
