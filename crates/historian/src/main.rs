use anyhow::Result;
use clap::Parser;
use historian_config::PluginConfig;
use tracing::debug;

mod agent;
mod cli;
mod context;
mod doctor;
mod logging;
mod mcp_server;
mod setup_cmds;
mod tool_cmds;
mod tools;

use cli::{Cli, Commands};
use context::{ToolContext, determine_project_root};
use tools::remember::RememberParams;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format;

    if let Commands::Install = cli.command {
        logging::with_bootstrap_logging(|| setup_cmds::handle_install(format))?;
        return Ok(());
    }

    let project_root = determine_project_root(cli.project.as_deref())?;
    let loaded = logging::with_bootstrap_logging(|| PluginConfig::load(&project_root));

    if let Commands::Doctor = cli.command {
        let healthy =
            logging::with_bootstrap_logging(|| doctor::run_doctor(&project_root, &loaded, format))?;
        std::process::exit(if healthy { 0 } else { 1 });
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    let log_guard = logging::init(&config);
    debug!(
        root = %project_root.display(),
        log_file = ?log_guard.log_file,
        "Configuration loaded"
    );

    let index = context::select_index(&config);
    let ctx = ToolContext::new(config, project_root, index);

    let ok = match cli.command {
        Commands::Install | Commands::Doctor => true,
        Commands::Serve => {
            let prewarm_ctx = ctx.clone();
            tokio::spawn(async move { prewarm_ctx.prewarm_external_paths().await });
            mcp_server::run_mcp_server(ctx).await?;
            true
        }
        Commands::Agent => {
            let payload = agent::agent_payload(&ctx.config);
            println!("{}", serde_json::to_string_pretty(&payload)?);
            true
        }
        Commands::Remember {
            title,
            content,
            memory_type,
            tags,
            target,
        } => {
            let params = RememberParams {
                title,
                content,
                memory_type,
                tags: (!tags.is_empty()).then_some(tags),
                target_record_ref: target,
            };
            run_or_report(tool_cmds::handle_remember(&ctx, params, format).await)
        }
        Commands::Recall {
            query,
            memory_type,
            limit,
            mode,
            fetch_all,
        } => {
            let args = tool_cmds::RecallArgs {
                query,
                memory_type,
                limit,
                mode,
                fetch_all,
            };
            run_or_report(tool_cmds::handle_recall(&ctx, args, format).await)
        }
        Commands::Forget { paths } => {
            run_or_report(tool_cmds::handle_forget(&ctx, paths, format).await)
        }
        Commands::ListTypes => run_or_report(tool_cmds::handle_list_types(&ctx, format)),
        Commands::Sync => run_or_report(tool_cmds::handle_sync(&ctx, format).await),
    };

    if !ok {
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

/// Print a tool error the way the CLI reports failures and map it to `false`.
fn run_or_report(result: Result<bool>) -> bool {
    match result {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("Error: {e:#}");
            false
        }
    }
}
