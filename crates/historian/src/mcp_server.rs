use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::context::ToolContext;
use crate::tools;

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// MCP server over stdio.
///
/// Exposes the memory tools as MCP tools using newline-delimited JSON-RPC 2.0.
/// Stdout carries protocol frames only; logs go to stderr.
pub async fn run_mcp_server(ctx: ToolContext) -> Result<()> {
    info!(root = %ctx.project_root.display(), "Starting MCP server on stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(&ctx, stdin, stdout).await?;
    info!("MCP server shutting down");
    Ok(())
}

/// Read requests from `reader` until EOF or `shutdown`, answering on `writer`.
pub async fn serve<R, W>(ctx: &ToolContext, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read line from stdin")?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!("Received: {trimmed}");

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {e}");
                let response =
                    JsonRpcResponse::failure(None, PARSE_ERROR, format!("Parse error: {e}"));
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        let is_shutdown = request.method == "shutdown";
        if let Some(response) = handle_request(ctx, request).await {
            write_response(&mut writer, &response).await?;
        }
        if is_shutdown {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcRequest {
    #[allow(dead_code)]
    #[serde(default)]
    jsonrpc: Option<String>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError { code, message }),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Serialize)]
struct McpToolDef {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

fn get_tools() -> Vec<McpToolDef> {
    tools::all_specs()
        .iter()
        .map(|spec| McpToolDef {
            name: spec.name,
            description: spec.description,
            input_schema: spec.input_schema(),
        })
        .collect()
}

/// `None` for notifications, which get no reply.
pub(crate) async fn handle_request(
    ctx: &ToolContext,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = request.id.clone();
    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "historian",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" | "shutdown" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": get_tools() })),
        "tools/call" => match parse_tool_call(request.params.as_ref()) {
            Ok((name, arguments)) => {
                JsonRpcResponse::success(id, call_tool_result(ctx, &name, &arguments).await)
            }
            Err(message) => JsonRpcResponse::failure(id, INVALID_PARAMS, message),
        },
        method if method.starts_with("notifications/") => {
            debug!("Notification: {method}");
            return None;
        }
        method => {
            if id.is_none() {
                return None;
            }
            JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
        }
    };
    Some(response)
}

fn parse_tool_call(params: Option<&Value>) -> std::result::Result<(String, Value), String> {
    let params = params.ok_or_else(|| "Missing params for tools/call".to_string())?;
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "Missing tool name".to_string())?;
    if tools::find_spec(name).is_none() {
        return Err(format!("Unknown tool: {name}"));
    }
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
    Ok((name.to_string(), arguments))
}

/// Tool outcome as MCP content. Tool failures are reported in-band with
/// `isError` so the calling agent can read them.
async fn call_tool_result(ctx: &ToolContext, name: &str, arguments: &Value) -> Value {
    debug!(tool = name, "Tool call with args: {arguments}");
    let (text, is_error) = match tools::call_tool(ctx, name, arguments).await {
        Ok(output) => (
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()),
            false,
        ),
        Err(e) => {
            warn!(tool = name, "Tool failed: {e:#}");
            (format!("{e:#}"), true)
        }
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut frame = serde_json::to_vec(response).context("Failed to serialize response")?;
    frame.push(b'\n');
    writer
        .write_all(&frame)
        .await
        .context("Failed to write response to stdout")?;
    writer.flush().await.context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
#[path = "mcp_server_tests.rs"]
mod tests;
