use anyhow::Result;
use base64::Engine;
use clap::{Parser, Subcommand};
use console::style;
use rafiq_core::{agent, config, providers, tools};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use rafiq_core::agent::{AgentExecutor, AgentRun};
use rafiq_core::traits::{ImageProvider, Provider, ToolOutput};

#[derive(Parser)]
#[command(name = "rafiq")]
#[command(about = "rafiq - Arabic assistant with tool dispatch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat { message: None });

    match command {
        Commands::Chat { message } => {
            let config = config::Config::load_or_init()?;

            if !config.workspace_dir.exists()
                && let Err(e) = std::fs::create_dir_all(&config.workspace_dir)
            {
                eprintln!(
                    "{} Could not create workspace at {}: {}",
                    style("Error:").red().bold(),
                    config.workspace_dir.display(),
                    e
                );
                return Err(e.into());
            }

            let provider: Arc<dyn Provider> = Arc::from(providers::create_provider(&config)?);
            let image_provider: Arc<dyn ImageProvider> =
                Arc::from(providers::create_image_provider(&config)?);
            let exa_api_key = providers::resolve_exa_api_key(&config).unwrap_or_else(|_| {
                tracing::warn!("no Exa API key configured; search will fail gracefully");
                String::new()
            });

            let registry = agent::ToolRegistry::new(vec![
                Arc::new(tools::ExplainCodeTool::new(provider.clone())),
                Arc::new(tools::GenerateCodeTool::new(provider.clone())),
                Arc::new(tools::SearchTool::new(exa_api_key)),
                Arc::new(tools::PdfTool::new(&config.workspace_dir)),
                Arc::new(tools::GenerateImageTool::new(
                    provider.clone(),
                    image_provider,
                )),
                Arc::new(tools::ChatTool::new(provider.clone())),
            ])?;

            let executor = AgentExecutor::new(provider, registry);
            let images_dir = config.workspace_dir.join("images");

            if let Some(msg) = message {
                match process(&executor, &msg).await {
                    Ok(run) => print_run(&run, &images_dir),
                    Err(e) => {
                        eprintln!("{} {}", style("Error:").red().bold(), e);
                        eprintln!("{}", style(executor.memory().context()).dim());
                        anyhow::bail!("agent run failed: {}", e);
                    }
                }
            } else {
                repl(&executor, &images_dir).await;
            }
        }
    }

    Ok(())
}

async fn repl(executor: &AgentExecutor, images_dir: &Path) {
    println!("{}", style("rafiq").bold());
    println!("Type your message (/reset to clear memory, Ctrl+D to exit):\n");

    use std::io::{self, BufRead};
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    loop {
        print!("> ");
        let _ = stdout_lock.flush();

        let mut input = String::new();
        let mut reader = stdin.lock();

        match reader.read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "/reset" {
                    executor.memory().clear();
                    println!("{}\n", style("memory cleared").dim());
                    continue;
                }

                match process(executor, input).await {
                    Ok(run) => print_run(&run, images_dir),
                    Err(e) => {
                        eprintln!("{} {}", style("Error:").red().bold(), e);
                        eprintln!("{}", style(executor.memory().context()).dim());
                    }
                }

                println!();
            }
            Err(_) => {
                println!("\nGoodbye!");
                break;
            }
        }
    }
}

/// Run one turn; Ctrl-C cancels the in-flight token, and the executor
/// resolves into a normal cancellation reply.
async fn process(executor: &AgentExecutor, message: &str) -> Result<AgentRun> {
    let cancel = CancellationToken::new();
    let run = executor.run(message, &cancel);
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => break result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n{}", style("cancelling...").yellow());
                cancel.cancel();
            }
        }
    }
}

fn print_run(run: &AgentRun, images_dir: &Path) {
    match &run.output {
        ToolOutput::Text { content } => println!("{}", content),
        ToolOutput::Image { data, .. } => match save_image(data, images_dir) {
            Ok(path) => println!("{} {}", style("image saved:").green(), path.display()),
            Err(e) => eprintln!("{} could not save image: {}", style("Error:").red().bold(), e),
        },
    }
}

fn save_image(data: &str, images_dir: &Path) -> Result<PathBuf> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    std::fs::create_dir_all(images_dir)?;
    let filename = format!("image_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = images_dir.join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
