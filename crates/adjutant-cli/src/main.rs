#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;

use clap::{Parser, Subcommand};

/// adjutant CLI — bootstrap and health-check the Adjutant daemon.
#[derive(Parser)]
#[command(name = "adjutant", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and register `.mcp.json` for this project.
    Init {
        /// Project root to write `.mcp.json` into.
        #[arg(short = 'p', long = "project-path", default_value = ".")]
        project_path: String,
        /// Overwrite an existing config file.
        #[arg(short = 'f', long, default_value_t = false)]
        force: bool,
        /// Output JSON.
        #[arg(short = 'j', long, default_value_t = false)]
        json: bool,
    },

    /// Environment and connectivity checks.
    Doctor {
        /// Exit non-zero if any checks fail.
        #[arg(short = 'S', long, default_value_t = false)]
        strict: bool,
        /// Output JSON.
        #[arg(short = 'j', long, default_value_t = false)]
        json: bool,
        /// Write JSON artifact to this file path.
        #[arg(short = 'o', long = "out")]
        out: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => commands::doctor::run(false, false, None),
        Some(Commands::Init { project_path, force, json }) => {
            commands::init::run(&project_path, force, json)
        }
        Some(Commands::Doctor { strict, json, out }) => {
            commands::doctor::run(strict, json, out.as_deref())
        }
    }
}
