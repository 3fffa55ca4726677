//! robocni - LLM-generated CNI configuration experiments
//!
//! ## Commands
//!
//! - `generate`: ask the model for one NetworkAttachmentDefinition
//! - `loop`: run repeated deploy-and-ping trials and report success rates

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use robocni_core::{
    render_network_attachment, ClusterControl, ConfigGenerator, Experiment, HintSet, HostContext,
    ModelQuery, TrialOrchestrator, TrialSettings, DEFAULT_MAX_ATTEMPTS,
};
use robocni_kube::{introspect_node_network, IntrospectionSettings, Kubectl};
use robocni_llm::{OllamaClient, OllamaConfig, DEFAULT_MODEL, DEFAULT_PORT};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "robocni")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate and test CNI configurations with an LLM", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Host of the generation service
    #[arg(long, env = "OLLAMA_HOST", global = true)]
    host: Option<String>,

    /// Port of the generation service
    #[arg(long, default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// Model to query
    #[arg(long, default_value = DEFAULT_MODEL, global = true)]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one NetworkAttachmentDefinition from a hint
    Generate {
        /// Natural-language description of the desired network
        hint: String,

        /// File with `ip route` output to include in the prompt
        #[arg(long)]
        route_file: Option<PathBuf>,

        /// File with `ip link show` output to include in the prompt
        #[arg(long)]
        link_file: Option<PathBuf>,

        /// Print the bare CNI configuration instead of the manifest
        #[arg(long)]
        bare: bool,

        /// Log every raw model reply
        #[arg(long)]
        debug: bool,

        /// Generation attempts before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        attempts: u32,
    },

    /// Run repeated trials against the current cluster
    Loop {
        /// File with one hint per line
        #[arg(long, default_value = "prompts.txt")]
        prompt_file: PathBuf,

        /// Number of trials
        #[arg(long, default_value_t = 1)]
        runs: u64,

        /// Give the model a worker node's routes and links
        #[arg(long)]
        introspect: bool,

        /// Namespace for the test objects
        #[arg(short, long)]
        namespace: Option<String>,

        /// kubectl executable
        #[arg(long, env = "KUBECTL", default_value = "kubectl")]
        kubectl: String,

        /// Seed for hint selection
        #[arg(long)]
        seed: Option<u64>,

        /// Generation attempts per trial
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        attempts: u32,

        /// Log every raw model reply
        #[arg(long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    robocni_core::init_tracing(cli.json, level);

    let host = cli
        .host
        .as_deref()
        .context("OLLAMA_HOST is not set (use --host or the OLLAMA_HOST environment variable)")?;
    let config = OllamaConfig::new(host)
        .with_port(cli.port)
        .with_model(&cli.model);
    info!(endpoint = %config.endpoint(), model = %config.model, "Using generation service");
    let model: Arc<dyn ModelQuery> =
        Arc::new(OllamaClient::new(config).context("Failed to create generation client")?);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Generate {
            hint,
            route_file,
            link_file,
            bare,
            debug,
            attempts,
        } => {
            let context = read_host_context(route_file.as_deref(), link_file.as_deref())?;
            cmd_generate(model, &hint, &context, attempts, bare, debug, &mut out).await
        }
        Commands::Loop {
            prompt_file,
            runs,
            introspect,
            namespace,
            kubectl,
            seed,
            attempts,
            debug,
        } => {
            let mut kubectl = Kubectl::new().with_binary(kubectl);
            if let Some(ns) = namespace {
                kubectl = kubectl.with_namespace(ns);
            }
            let context = if introspect {
                introspect_node_network(&kubectl, &IntrospectionSettings::default())
                    .await
                    .context("Error introspecting node network")?
            } else {
                HostContext::default()
            };

            let mut settings = TrialSettings::default().with_max_attempts(attempts);
            if let Some(seed) = seed {
                settings = settings.with_seed(seed);
            }
            let cluster: Arc<dyn ClusterControl> = Arc::new(kubectl);
            cmd_loop(
                model,
                cluster,
                &prompt_file,
                runs,
                settings,
                context,
                debug,
                &mut out,
            )
            .await
        }
    }
}

/// Read optional route and link files into a prompt context.
fn read_host_context(route_file: Option<&Path>, link_file: Option<&Path>) -> Result<HostContext> {
    let read = |path: Option<&Path>| -> Result<Option<String>> {
        path.map(|p| {
            std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))
        })
        .transpose()
    };
    Ok(HostContext::new(read(route_file)?, read(link_file)?))
}

async fn cmd_generate(
    model: Arc<dyn ModelQuery>,
    hint: &str,
    context: &HostContext,
    attempts: u32,
    bare: bool,
    debug: bool,
    out: &mut impl Write,
) -> Result<()> {
    let generator = ConfigGenerator::new(model)
        .with_max_attempts(attempts)
        .with_reply_logging(debug);
    let config = generator
        .generate(hint, context)
        .await
        .context("Failed to generate a CNI configuration")?;

    if bare {
        let value: serde_json::Value = serde_json::from_str(&config.config_text)
            .context("Generated configuration is not valid JSON")?;
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        write!(
            out,
            "{}",
            render_network_attachment(&config.name, &config.config_text)
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_loop(
    model: Arc<dyn ModelQuery>,
    cluster: Arc<dyn ClusterControl>,
    prompt_file: &Path,
    runs: u64,
    settings: TrialSettings,
    context: HostContext,
    debug: bool,
    out: &mut impl Write,
) -> Result<()> {
    let hints = HintSet::from_file(prompt_file)
        .with_context(|| format!("Failed to load hints from {}", prompt_file.display()))?;
    info!(hints = hints.len(), runs, "Loaded hints");

    let orchestrator = TrialOrchestrator::new(model, cluster, hints, settings)
        .with_context(context)
        .with_reply_logging(debug);
    let mut experiment = Experiment::new(orchestrator);
    experiment
        .run(runs, out)
        .await
        .context("Failed to write report")?;
    Ok(())
}
