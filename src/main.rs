use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use widgetbind::config::EngineConfig;
use widgetbind::logging::init_tracing;
use widgetbind::session::{Collaborators, Session};
use widgetbind::tree::{RenderMode, TreeDocument};
use widgetbind::widgets::WidgetEvent;

#[derive(Parser)]
#[command(name = "widgetbind")]
#[command(about = "Evaluate, inspect and render widget pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the evaluated snapshot of a page as JSON
    Eval {
        /// Page document (JSON)
        page: PathBuf,

        /// Wait for on-load queries before printing
        #[arg(long)]
        settle: bool,
    },

    /// Print the dependency graph and any cycles
    Graph {
        /// Page document (JSON)
        page: PathBuf,
    },

    /// Render a page as a JSON element tree
    Render {
        /// Page document (JSON)
        page: PathBuf,

        /// Render mode (defaults to the configured mode)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Deliver an event to a widget and print the resulting snapshot
    Fire {
        /// Page document (JSON)
        page: PathBuf,

        /// Target widget id
        widget: String,

        /// Event to deliver
        #[arg(value_enum)]
        event: EventArg,

        /// Text for text-change events
        #[arg(long)]
        text: Option<String>,

        /// Row index for row-selection events
        #[arg(long)]
        index: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Editor,
    View,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Editor => RenderMode::Editor,
            ModeArg::View => RenderMode::View,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EventArg {
    Click,
    ModalClose,
    TextChanged,
    RowSelected,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };

    match cli.command {
        Commands::Eval { page, settle } => {
            let mut session = open(&page, config).await?;
            session.run_on_load();
            if settle {
                session.settle().await;
            }
            println!("{}", serde_json::to_string_pretty(session.evaluated())?);
        }
        Commands::Graph { page } => {
            let session = open(&page, config).await?;
            let graph = session.graph();
            for path in graph.paths() {
                let deps: Vec<String> = graph.dependencies_of(path).iter().map(ToString::to_string).collect();
                let kind = graph.kind(path).map(|kind| format!("{:?}", kind)).unwrap_or_default();
                println!("{} [{}] <- {}", path, kind, deps.join(", "));
            }
            let all = graph.paths().cloned().collect();
            for cycle in graph.cycles_within(&all) {
                let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                println!("cycle: {}", members.join(" -> "));
            }
        }
        Commands::Render { page, mode } => {
            let session = open(&page, config).await?;
            let rendered = session.render(mode.map(RenderMode::from))?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Commands::Fire {
            page,
            widget,
            event,
            text,
            index,
        } => {
            let event = match event {
                EventArg::Click => WidgetEvent::Click,
                EventArg::ModalClose => WidgetEvent::ModalClose,
                EventArg::TextChanged => WidgetEvent::TextChanged {
                    text: text.unwrap_or_default(),
                },
                EventArg::RowSelected => match index {
                    Some(index) => WidgetEvent::RowSelected { index },
                    None => bail!("row-selected requires --index"),
                },
            };
            let mut session = open(&page, config).await?;
            match session.fire_event(&widget, event).await? {
                Some(outcome) => eprintln!("Trigger {} ran {} action(s)", outcome.run_id, outcome.executed),
                None => eprintln!("No trigger ran"),
            }
            println!("{}", serde_json::to_string_pretty(session.evaluated())?);
        }
    }
    Ok(())
}

async fn open(page: &Path, config: EngineConfig) -> Result<Session> {
    let text = tokio::fs::read_to_string(page)
        .await
        .with_context(|| format!("Failed to read page {}", page.display()))?;
    let document = TreeDocument::from_json(&text)?;
    Ok(Session::from_document(document, config, Collaborators::default())?)
}
