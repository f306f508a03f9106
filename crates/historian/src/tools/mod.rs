//! The five memory tools exposed to the host assistant.
//!
//! Each tool module declares a static [`ToolSpec`](args::ToolSpec), a params
//! struct built from loose JSON at the boundary, and an async `run` over a
//! [`ToolContext`]. [`call_tool`] is the single dispatch point used by both
//! the MCP server and the CLI subcommands.

pub mod args;
pub mod forget;
pub mod list_types;
pub mod recall;
pub mod remember;
pub mod sync;

#[cfg(test)]
pub mod test_support;

use anyhow::Result;
use historian_core::HistorianError;
pub use historian_memory::format_timestamp;
use serde_json::Value;

use crate::context::ToolContext;
use args::ToolSpec;

pub fn all_specs() -> [&'static ToolSpec; 5] {
    [
        &remember::SPEC,
        &recall::SPEC,
        &forget::SPEC,
        &list_types::SPEC,
        &sync::SPEC,
    ]
}

pub fn find_spec(name: &str) -> Option<&'static ToolSpec> {
    all_specs().into_iter().find(|spec| spec.name == name)
}

/// Run tool `name` with raw JSON arguments and return its JSON output.
pub async fn call_tool(ctx: &ToolContext, name: &str, args: &Value) -> Result<Value> {
    let output = match name {
        n if n == remember::SPEC.name => {
            let params = remember::RememberParams::from_args(args)?;
            serde_json::to_value(remember::run(ctx, params).await?)?
        }
        n if n == recall::SPEC.name => {
            let params = recall::RecallParams::from_args(args)?;
            serde_json::to_value(recall::run(ctx, params).await?)?
        }
        n if n == forget::SPEC.name => {
            let params = forget::ForgetParams::from_args(args)?;
            serde_json::to_value(forget::run(ctx, params).await?)?
        }
        n if n == list_types::SPEC.name => serde_json::to_value(list_types::run(ctx))?,
        n if n == sync::SPEC.name => serde_json::to_value(sync::run(ctx).await)?,
        other => {
            return Err(HistorianError::Validation(format!("unknown tool: {other}")).into());
        }
    };
    Ok(output)
}
