use super::*;
use crate::tools::test_support::Fixture;

async fn exchange(fx: &Fixture, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    serve(&fx.ctx, input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn request(id: u64, method: &str, params: Value) -> String {
    format!(
        "{}\n",
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
    )
}

fn tool_text(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap_or_else(|_| json!(text))
}

// --- get_tools ---

#[test]
fn get_tools_lists_the_memory_tools() {
    let tools = get_tools();
    assert_eq!(tools.len(), 5);
    for tool in &tools {
        assert!(tool.name.starts_with("memory_"));
        assert!(!tool.description.is_empty(), "{}", tool.name);
        assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
    }
}

#[test]
fn get_tools_remember_requires_core_fields() {
    let tools = get_tools();
    let remember = tools.iter().find(|t| t.name == "memory_remember").unwrap();
    assert_eq!(
        remember.input_schema["required"],
        json!(["title", "content", "memoryType"])
    );
    let forget = tools.iter().find(|t| t.name == "memory_forget").unwrap();
    assert_eq!(forget.input_schema["required"], json!(["recordPaths"]));
}

// --- protocol ---

#[tokio::test]
async fn initialize_and_list() {
    let fx = Fixture::new();
    let input = [
        request(1, "initialize", json!({})),
        "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n".to_string(),
        request(2, "tools/list", json!({})),
        request(3, "ping", Value::Null),
    ]
    .concat();
    let responses = exchange(&fx, &input).await;

    assert_eq!(responses.len(), 3, "notification must not be answered");
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "historian");
    assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 5);
    assert_eq!(responses[2]["result"], json!({}));
}

#[tokio::test]
async fn parse_error_and_unknown_method() {
    let fx = Fixture::new();
    let input = format!("not json\n\n{}", request(7, "resources/list", json!({})));
    let responses = exchange(&fx, &input).await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(responses[1]["id"], 7);
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let fx = Fixture::new();
    let input = request(4, "tools/call", json!({"name": "memory_compound", "arguments": {}}));
    let responses = exchange(&fx, &input).await;
    assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);

    let input = request(5, "tools/call", json!({}));
    let responses = exchange(&fx, &input).await;
    assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn shutdown_stops_reading() {
    let fx = Fixture::new();
    let input = [
        request(1, "shutdown", Value::Null),
        request(2, "ping", Value::Null),
    ]
    .concat();
    let responses = exchange(&fx, &input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
}

// --- tools/call ---

#[tokio::test]
async fn remember_then_list_types_over_the_wire() {
    let fx = Fixture::new();
    let input = [
        request(
            1,
            "tools/call",
            json!({
                "name": "memory_remember",
                "arguments": {
                    "title": "Use Tokio",
                    "content": "All async code runs on tokio.",
                    "memoryType": "architectural-decision",
                    "tags": "runtime"
                }
            }),
        ),
        request(2, "tools/call", json!({"name": "memory_list_types"})),
    ]
    .concat();
    let responses = exchange(&fx, &input).await;

    assert_eq!(responses[0]["result"]["isError"], false);
    let saved = tool_text(&responses[0]);
    assert_eq!(saved["filePath"], ".mnemonics/architectural-decision/use-tokio.md");
    assert_eq!(saved["tags"], json!(["runtime"]));
    assert!(fx.root.join(".mnemonics/architectural-decision/use-tokio.md").is_file());

    let types = tool_text(&responses[1]);
    assert_eq!(types["fallbackType"], "context");
}

#[tokio::test]
async fn tool_errors_are_reported_in_band() {
    let fx = Fixture::new();
    let input = request(
        9,
        "tools/call",
        json!({
            "name": "memory_remember",
            "arguments": {"title": "T", "content": "C", "memoryType": "not-a-type"}
        }),
    );
    let responses = exchange(&fx, &input).await;

    assert!(responses[0].get("error").is_none());
    assert_eq!(responses[0]["result"]["isError"], true);
    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Invalid memory type"), "{text}");
}

#[tokio::test]
async fn recall_with_empty_index_returns_message() {
    let fx = Fixture::new();
    let input = request(
        3,
        "tools/call",
        json!({"name": "memory_recall", "arguments": {"query": "anything"}}),
    );
    let responses = exchange(&fx, &input).await;
    let out = tool_text(&responses[0]);
    assert_eq!(out["count"], 0);
    assert_eq!(out["records"], json!([]));
    assert!(out["message"].is_string());
}
