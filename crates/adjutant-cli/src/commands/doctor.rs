use std::path::PathBuf;

use adjutant_core::config::Config;
use adjutant_core::lockfile::DaemonLockfile;
use serde_json::json;

/// Run a structured set of environment/connectivity health checks and report
/// each as pass/fail.
pub fn run(strict: bool, json_output: bool, out_path: Option<&str>) -> anyhow::Result<()> {
    let mut failures = 0usize;

    let config_path = Config::default_path();
    let config_check = match Config::load() {
        Ok(_) if config_path.exists() => json!({"ok": true, "path": config_path.display().to_string()}),
        Ok(_) => {
            json!({"ok": true, "path": config_path.display().to_string(), "note": "no config file, using defaults"})
        }
        Err(e) => {
            failures += 1;
            json!({"ok": false, "path": config_path.display().to_string(), "error": e.to_string()})
        }
    };
    let config = Config::load().unwrap_or_default();

    let workspace_root = PathBuf::from(&config.daemon.workspace_root);
    let workspace_exists = workspace_root.is_dir();
    if !workspace_exists {
        failures += 1;
    }

    let bd_check = binary_on_path("bd");
    if !bd_check.0 {
        failures += 1;
    }
    let tmux_check = binary_on_path("tmux");
    if !tmux_check.0 {
        failures += 1;
    }

    let lockfile_check = match DaemonLockfile::read_valid() {
        Some(lock) => json!({
            "ok": true,
            "pid": lock.pid,
            "api_url": lock.api_url(),
        }),
        None => {
            failures += 1;
            json!({"ok": false, "note": "no running daemon found"})
        }
    };

    let result = json!({
        "config": config_check,
        "workspace_root": {
            "ok": workspace_exists,
            "path": workspace_root.display().to_string(),
        },
        "bd": {"ok": bd_check.0, "path": bd_check.1},
        "tmux": {"ok": tmux_check.0, "path": tmux_check.1},
        "daemon": lockfile_check,
        "failures": failures,
    });

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("doctor report");
        println!("{}", "-".repeat(40));
        print_check("config", result["config"]["ok"].as_bool().unwrap_or(false));
        print_check("workspace root", workspace_exists);
        print_check("bd on PATH", bd_check.0);
        print_check("tmux on PATH", tmux_check.0);
        print_check("daemon running", result["daemon"]["ok"].as_bool().unwrap_or(false));
        println!("Failures: {failures}");
    }

    if let Some(path) = out_path {
        write_json_artifact(path, &result)?;
    }

    if strict && failures > 0 {
        anyhow::bail!("doctor checks failed ({failures} issues)");
    }

    Ok(())
}

fn print_check(label: &str, ok: bool) {
    println!("{:<16} {}", label, if ok { "ok" } else { "failed" });
}

/// Returns `(found, resolved_path)` for a binary on `PATH`.
fn binary_on_path(name: &str) -> (bool, Option<String>) {
    let Some(path_var) = std::env::var_os("PATH") else {
        return (false, None);
    };
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return (true, Some(candidate.display().to_string()));
        }
    }
    (false, None)
}

fn write_json_artifact(path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let out_path = PathBuf::from(path);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out_path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
