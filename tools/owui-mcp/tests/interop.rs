use std::time::Duration;

use anyhow::Result;
use assert_cmd::cargo::cargo_bin;
use rmcp::{
    ServiceExt,
    model::CallToolRequestParam,
    transport::child_process::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Value, json};
use tokio::process::Command;
use tokio::time::sleep;

const MOCK_KEY: &str = "mock-key";

fn free_port() -> std::io::Result<u16> {
    std::net::TcpListener::bind("127.0.0.1:0").map(|listener| {
        listener
            .local_addr()
            .map(|addr| addr.port())
            .expect("local addr")
    })
}

async fn spawn_mock() -> Result<(tokio::process::Child, String)> {
    let addr = format!("127.0.0.1:{}", free_port()?);
    let child = Command::new(cargo_bin("mock-owui-server"))
        .env("MOCK_HTTP_ADDR", &addr)
        .env("MOCK_REQUIRE_AUTH", "1")
        .env("MOCK_API_KEY", MOCK_KEY)
        .kill_on_drop(true)
        .spawn()?;

    let health = format!("http://{addr}/health");
    let http = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = http.get(&health).send().await {
            if resp.status().is_success() {
                return Ok((child, addr));
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("mock server did not become healthy at {addr}");
}

async fn connect(addr: &str) -> Result<rmcp::service::RunningService<rmcp::service::RoleClient, ()>> {
    let bin = cargo_bin("owui-mcp");
    let api_url = format!("http://{addr}/api");
    let service = ()
        .serve(TokioChildProcess::new(Command::new(&bin).configure(
            |cmd| {
                cmd.env("OWUI_API_URL", &api_url)
                    .env("OWUI_API_KEY", MOCK_KEY)
                    .env("RUST_LOG", "info");
            },
        ))?)
        .await?;
    Ok(service)
}

fn structured(result: &rmcp::model::CallToolResult) -> &Value {
    result
        .structured_content
        .as_ref()
        .expect("structured content")
}

#[tokio::test]
async fn registry_covers_every_router_and_listing_is_stable() -> Result<()> {
    let (_mock, addr) = spawn_mock().await?;
    let service = connect(&addr).await?;

    let first = service.list_tools(Default::default()).await?.tools;
    let names: Vec<String> = first.iter().map(|t| t.name.to_string()).collect();
    for expected in [
        "chats__list",
        "chats__get",
        "chats__create",
        "chats__delete",
        "chats__search",
        "models__list",
        "models__get",
        "models__delete",
        "prompts__list",
        "prompts__create",
        "knowledge__list",
        "knowledge__create",
        "users__list",
        "users__update_role",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }

    // schema spot checks
    let search = first
        .iter()
        .find(|t| t.name.as_ref() == "chats__search")
        .expect("chats__search tool");
    let schema = serde_json::to_value(search.input_schema.as_ref())?;
    assert_eq!(schema["required"], json!(["text"]));
    assert_eq!(schema["properties"]["page"]["type"], json!("integer"));

    let create = first
        .iter()
        .find(|t| t.name.as_ref() == "knowledge__create")
        .expect("knowledge__create tool");
    let schema = serde_json::to_value(create.input_schema.as_ref())?;
    assert_eq!(schema["required"], json!(["name"]));
    assert_eq!(schema["properties"]["description"]["default"], json!(""));

    // an unchanged client must list the same tools again
    let second = service.list_tools(Default::default()).await?.tools;
    let second_names: Vec<String> = second.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, second_names);

    Ok(())
}

#[tokio::test]
async fn chat_round_trip_through_the_wrapped_api() -> Result<()> {
    let (_mock, addr) = spawn_mock().await?;
    let service = connect(&addr).await?;

    let created = service
        .call_tool(CallToolRequestParam {
            name: "chats__create".into(),
            arguments: json!({"title": "weekly sync", "tags": ["work"]})
                .as_object()
                .cloned(),
        })
        .await?;
    let chat = structured(&created);
    let id = chat["id"].as_str().expect("chat id").to_string();
    assert_eq!(chat["title"], json!("weekly sync"));
    // omitted parameter arrives with its declared default
    assert_eq!(chat["archived"], json!(false));

    let fetched = service
        .call_tool(CallToolRequestParam {
            name: "chats__get".into(),
            arguments: json!({"id": id}).as_object().cloned(),
        })
        .await?;
    assert_eq!(structured(&fetched)["title"], json!("weekly sync"));

    let found = service
        .call_tool(CallToolRequestParam {
            name: "chats__search".into(),
            arguments: json!({"text": "weekly"}).as_object().cloned(),
        })
        .await?;
    let hits = structured(&found).as_array().expect("search results");
    assert_eq!(hits.len(), 1);

    Ok(())
}

#[tokio::test]
async fn knowledge_create_observes_declared_defaults() -> Result<()> {
    let (_mock, addr) = spawn_mock().await?;
    let service = connect(&addr).await?;

    let created = service
        .call_tool(CallToolRequestParam {
            name: "knowledge__create".into(),
            arguments: json!({"name": "docs"}).as_object().cloned(),
        })
        .await?;
    let entry = structured(&created);
    assert_eq!(entry["name"], json!("docs"));
    // `description` was omitted; the underlying call received the default
    assert_eq!(entry["description"], json!(""));

    Ok(())
}

#[tokio::test]
async fn tooldump_prints_the_registry_without_serving() -> Result<()> {
    // Discovery never touches the network, so no mock is needed here.
    let output = assert_cmd::Command::new(cargo_bin("tooldump"))
        .arg("--api-url")
        .arg("http://127.0.0.1:1/api")
        .output()?;
    assert!(output.status.success());
    let tools: Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = tools
        .as_array()
        .expect("tool array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"chats__list"));
    assert!(names.contains(&"users__get"));
    Ok(())
}
