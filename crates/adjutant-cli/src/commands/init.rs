use std::path::PathBuf;

use adjutant_core::config::Config;
use serde_json::json;

/// Bootstrap `~/.adjutant/config.toml` and a project-local `.mcp.json` that
/// points MCP clients at the daemon's streamable-HTTP endpoint.
///
/// Refuses to overwrite an existing config unless `force` is set.
pub fn run(project_path: &str, force: bool, json_output: bool) -> anyhow::Result<()> {
    let config_path = Config::default_path();
    let config_existed = config_path.exists();

    if config_existed && !force {
        if json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "ok": false,
                    "error": "config already exists",
                    "config_path": config_path.display().to_string(),
                }))?
            );
        } else {
            eprintln!(
                "config already exists at {}\n\nHint: use --force to overwrite it.",
                config_path.display()
            );
        }
        anyhow::bail!("config already exists at {}", config_path.display());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let config = Config::default();
    std::fs::write(&config_path, config.to_toml()?)?;

    let mcp_json_path = PathBuf::from(project_path).join(".mcp.json");
    write_mcp_json(&mcp_json_path, config.daemon.port)?;

    let result = json!({
        "ok": true,
        "config_path": config_path.display().to_string(),
        "config_overwritten": config_existed,
        "mcp_json_path": mcp_json_path.display().to_string(),
    });

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("wrote config: {}", config_path.display());
        println!("wrote mcp registration: {}", mcp_json_path.display());
    }

    Ok(())
}

fn write_mcp_json(path: &PathBuf, daemon_port: u16) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = json!({
        "mcpServers": {
            "adjutant": {
                "type": "http",
                "url": format!("http://127.0.0.1:{daemon_port}/mcp"),
            }
        }
    });
    std::fs::write(path, serde_json::to_string_pretty(&contents)?)?;
    Ok(())
}
