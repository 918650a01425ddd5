//! `docgraph`: print the graph of a structured document.
//!
//! Usage:
//!   docgraph config.yaml                      # node/edge summary
//!   docgraph data.json --search name          # matching nodes
//!   docgraph data.json --direction-rotations 3 --export

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use docgraph::{Format, RecomputeOutcome, Session, ViewerConfig};

#[derive(Parser)]
#[command(name = "docgraph")]
#[command(about = "Turn a JSON, YAML, TOML, XML or CSV document into a node/edge graph")]
struct Args {
    /// Document to read
    file: PathBuf,

    /// Input format (json, yaml, toml, xml, csv); inferred from the extension if omitted
    #[arg(short = 'f', long)]
    format: Option<Format>,

    /// Quarter turns to apply to the layout direction, starting from RIGHT
    #[arg(short = 'r', long, default_value_t = 0)]
    direction_rotations: u8,

    /// Print nodes whose label or value contains this term
    #[arg(short = 's', long)]
    search: Option<String>,

    /// Print the whole graph as JSON
    #[arg(long)]
    export: bool,

    /// Viewer configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

fn infer_format(path: &Path) -> Option<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ViewerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ViewerConfig::default(),
    };

    let Some(format) = args.format.or_else(|| infer_format(&args.file)) else {
        eprintln!(
            "Cannot infer the format of {}; pass --format",
            args.file.display()
        );
        return ExitCode::FAILURE;
    };

    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = match Session::new(config.with_live(false)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    for _ in 0..args.direction_rotations % 4 {
        session.rotate_direction();
    }
    session.set_document(text, format);
    if let RecomputeOutcome::Failed(e) = session.trigger_recompute() {
        eprintln!("{}: {}", args.file.display(), e);
        return ExitCode::FAILURE;
    }

    let graph = session.current_graph();
    if args.export {
        match graph.to_json_pretty() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing graph: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!(
        "{} ({}): {} nodes, {} edges, direction {}",
        args.file.display(),
        format,
        graph.len(),
        graph.edges().len(),
        graph.direction()
    );

    if let Some(term) = &args.search {
        let hits = session.search(term);
        println!("{} match(es) for {:?}", hits.len(), term);
        for node in hits {
            match node.scalar_value() {
                Some(value) => println!("  {}  = {}", node.id, value),
                None => println!("  {}  {}", node.id, node.value),
            }
        }
    }

    ExitCode::SUCCESS
}
