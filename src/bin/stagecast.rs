use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use stagecast::{CostumePayload, HttpFetch, LoadedProject, LoaderConfig, ProjectLoader, Reporter};

#[derive(Parser, Debug)]
#[command(name = "stagecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a packaged project and print a summary of the built graph.
    Info(InfoArgs),
    /// Fetch a project by id from the remote service and print a summary.
    Fetch(FetchArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input project package (zip with a bundled project.json).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Also wait for the instrument bank (requires network access).
    #[arg(long)]
    instruments: bool,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Project id on the remote service.
    #[arg(long)]
    id: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args).await,
        Command::Fetch(args) => cmd_fetch(args).await,
    }
}

async fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read package '{}'", args.in_path.display()))?;

    let loader = ProjectLoader::new(std::sync::Arc::new(HttpFetch::new()), LoaderConfig::default());
    let mut project = loader.load_from_archive(&bytes).await?;

    if args.instruments {
        project.join_all().await?;
    } else {
        project.join_assets().await?;
    }
    print_summary(&project);
    Ok(())
}

async fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let loader = ProjectLoader::new(std::sync::Arc::new(HttpFetch::new()), LoaderConfig::default());
    let mut project = loader.load_from_network(args.id).await?;
    project.join_all().await?;
    print_summary(&project);
    Ok(())
}

fn print_summary(project: &LoadedProject) {
    let graph = &project.graph;

    println!("stage: {}", graph.stage.name);
    println!(
        "  stacks: {}, sounds: {}/{} loaded, costumes: {}",
        graph.stage.stacks.len(),
        graph.stage.sounds_loaded(),
        graph.stage.sounds.len(),
        graph.stage.costumes.len(),
    );
    for list in &graph.stage.lists {
        println!("  list '{}' ({} items)", list.name, list.contents.len());
    }

    println!("sprites: {}", graph.sprites.len());
    for sprite in &graph.sprites {
        println!(
            "  [{}] {}: {} stacks, {}/{} sounds loaded, {} costumes, {} local lists",
            sprite.layer,
            sprite.name,
            sprite.stacks.len(),
            sprite.sounds_loaded(),
            sprite.sounds.len(),
            sprite.costumes.len(),
            sprite.lists.len(),
        );
        for costume in &sprite.costumes {
            if let Some(CostumePayload::DataUrl(url)) = costume.payload() {
                let marker = url.split(';').next().unwrap_or(url);
                println!("    costume '{}' embedded as {marker}", costume.name);
            }
        }
    }

    println!("reporters: {}", graph.reporters.len());
    for reporter in &graph.reporters {
        match reporter {
            Reporter::Watcher(w) => println!(
                "  watcher {} ({})",
                w.param.as_deref().unwrap_or("?"),
                w.cmd.as_deref().unwrap_or("?"),
            ),
            Reporter::List(l) => println!("  list '{}' owned by {}", l.name, l.owner),
        }
    }

    println!(
        "instruments loaded: {}/{}",
        project.instruments.loaded(),
        stagecast::InstrumentTable::bank_size(),
    );
}
