use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lanternconf::{ConfigSources, LanternConfig};
use wick::Handler;

use lantern::host::{HostContext, Limits};
use lantern::{build_state, telemetry};

#[derive(Parser, Debug)]
#[command(version, about = "Read-only project introspection for AI assistants over MCP", long_about = None)]
struct Cli {
    /// Config file (default: ./lantern.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root containing the app directories
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Settings file (TOML or JSON)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Project manifest (TOML)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Application log file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over stdin/stdout
    ServeStdio,

    /// Serve MCP over streamable HTTP at /mcp
    ServeHttp {
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the advertised tool catalog as JSON
    Tools,

    /// Print the effective configuration and where it came from
    Config,
}

impl Cli {
    /// Command-line paths win over files and environment. They are taken
    /// relative to `cwd`, not to the project root.
    fn apply(&self, config: &mut LanternConfig, cwd: &Path) {
        let absolute = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            }
        };

        if let Some(root) = &self.project_root {
            config.project.root = absolute(root);
        }
        if let Some(path) = &self.settings {
            config.settings.file = Some(absolute(path));
        }
        if let Some(path) = &self.manifest {
            config.project.manifest = Some(absolute(path));
        }
        if let Some(path) = &self.database {
            config.database.path = Some(absolute(path));
        }
        if let Some(path) = &self.log_file {
            config.logs.file = Some(absolute(path));
        }
    }
}

fn load_config(cli: &Cli) -> Result<(LanternConfig, ConfigSources)> {
    let (mut config, sources) = LanternConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    cli.apply(&mut config, &cwd);
    config.validate().context("Invalid configuration")?;
    Ok((config, sources))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, sources) = load_config(&cli)?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
            println!();
            println!("# Sources");
            for file in &sources.files {
                println!("#   file: {}", file.display());
            }
            for var in &sources.env_overrides {
                println!("#   env:  {}", var);
            }
            Ok(())
        }
        Command::Tools => {
            let mut host = HostContext::unconfigured();
            host.limits = Limits::from(&config);
            let state = build_state(host).context("Failed to build tool catalog")?;
            let tools = state.handler.tools();
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
        Command::ServeStdio => {
            let _telemetry = telemetry::init(&config.telemetry).context("Failed to initialize telemetry")?;
            let state = startup(&config)?;
            tracing::info!("Serving MCP on stdio");
            wick::serve_stdio(state).await.context("stdio transport failed")?;
            tracing::info!("stdin closed, exiting");
            Ok(())
        }
        Command::ServeHttp { port } => {
            if let Some(port) = port {
                config.bind.http_port = port;
            }
            let _telemetry = telemetry::init(&config.telemetry).context("Failed to initialize telemetry")?;
            let state = startup(&config)?;

            let addr: SocketAddr = format!("{}:{}", config.bind.host, config.bind.http_port)
                .parse()
                .context("Failed to parse bind address")?;
            lantern::server::serve_http(state, addr).await
        }
    }
}

fn startup(config: &LanternConfig) -> Result<std::sync::Arc<wick::McpState<lantern::api::LanternHandler>>> {
    tracing::info!(root = %config.project.root.display(), "Starting lantern");
    let host = HostContext::from_config(config).context("Failed to load project")?;
    let state = build_state(host).context("Failed to build tool catalog")?;
    tracing::info!(tools = state.handler.tools().len(), "Tool catalog ready");
    Ok(state)
}
