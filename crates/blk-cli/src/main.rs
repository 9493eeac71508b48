//! `blk` CLI — format, convert, query and edit BLK files from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Canonical formatting (stdin → stdout)
//! cat mission.blk | blk fmt
//!
//! # Export to pretty-printed JSON
//! blk json -i mission.blk -o mission.json
//!
//! # Read and write values by path (`/`-separated, `#N` for positions)
//! blk get -i mission.blk mission_settings/mission/locName
//! blk set -i mission.blk -o out.blk units/#0/props/count i=4
//!
//! # Search
//! blk find-key -i mission.blk weapons
//! blk find-value -i mission.blk --scope units --indices 't="t1"'
//! blk parent -i mission.blk units/tankModels/name
//!
//! # Validate and summarize
//! blk check -i mission.blk
//! ```

use anyhow::{Context, Result};
use blk_core::{Block, ParseOptions, Parser as BlkParser, Path, PathStyle, Tree, Value};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blk", version, about = "BLK typed block file CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Maximum block nesting depth accepted by the parser
    #[arg(long, global = true, env = "BLK_MAX_DEPTH", default_value_t = blk_core::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

/// Input and output locations shared by every subcommand.
#[derive(Args)]
struct IoArgs {
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and re-serialize in canonical form
    Fmt {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Export as pretty-printed JSON
    Json {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Print the value at PATH
    Get {
        #[command(flatten)]
        io: IoArgs,
        /// Path such as `mission_settings/player/wing` or `units/#0`
        path: Path,
    },
    /// Replace the value at PATH and print the resulting document
    Set {
        #[command(flatten)]
        io: IoArgs,
        path: Path,
        /// Typed literal such as `r=2.5`, `b=yes` or `t="name"`
        literal: String,
    },
    /// Print the path of the first entry named KEY
    FindKey {
        #[command(flatten)]
        io: IoArgs,
        key: String,
        /// Report positions (`#N`) instead of keys
        #[arg(long)]
        indices: bool,
    },
    /// Print the path of the first entry holding LITERAL
    FindValue {
        #[command(flatten)]
        io: IoArgs,
        /// Typed literal such as `t="t1"` or `i=3`
        literal: String,
        /// Only search below the first entry with this key
        #[arg(long)]
        scope: Option<String>,
        /// Report positions (`#N`) instead of keys
        #[arg(long)]
        indices: bool,
    },
    /// Print the path of the block containing the entry at PATH
    Parent {
        #[command(flatten)]
        io: IoArgs,
        path: Path,
    },
    /// Validate the document and print entry and block counts
    Check {
        #[command(flatten)]
        io: IoArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let parser = BlkParser::with_options(ParseOptions {
        max_depth: cli.max_depth,
    });

    match cli.command {
        Commands::Fmt { io } => {
            let tree = load(&parser, &io)?;
            let text = blk_core::serialize(&tree).context("Failed to serialize BLK")?;
            write_output(io.output.as_deref(), &text)?;
        }
        Commands::Json { io } => {
            let tree = load(&parser, &io)?;
            let json = blk_core::to_json_string(&tree, true).context("Failed to export JSON")?;
            write_output(io.output.as_deref(), &json)?;
        }
        Commands::Get { io, path } => {
            let tree = load(&parser, &io)?;
            let entry = blk_core::entry_at(&tree, &path)
                .with_context(|| format!("No entry at path: {}", path))?;
            let text = match &entry.value {
                Value::Block(_) => blk_core::serialize(&Block::from(vec![entry.clone()])),
                scalar => blk_core::render_value(scalar),
            }
            .context("Failed to render value")?;
            write_output(io.output.as_deref(), &text)?;
        }
        Commands::Set { io, path, literal } => {
            let mut tree = load(&parser, &io)?;
            let value = parser
                .parse_value(&literal)
                .with_context(|| format!("Invalid value literal: {}", literal))?;
            if !blk_core::set_value_at(&mut tree, &path, value) {
                anyhow::bail!("No entry at path: {}", path);
            }
            let text = blk_core::serialize(&tree).context("Failed to serialize BLK")?;
            write_output(io.output.as_deref(), &text)?;
        }
        Commands::FindKey { io, key, indices } => {
            let tree = load(&parser, &io)?;
            let path = blk_core::find_path_of_key(&tree, &key, style(indices))
                .with_context(|| format!("No entry named: {}", key))?;
            write_output(io.output.as_deref(), &path.to_string())?;
        }
        Commands::FindValue {
            io,
            literal,
            scope,
            indices,
        } => {
            let tree = load(&parser, &io)?;
            let target = parser
                .parse_value(&literal)
                .with_context(|| format!("Invalid value literal: {}", literal))?;
            let path =
                blk_core::find_path_of_value(&tree, &target, scope.as_deref(), style(indices))
                    .with_context(|| format!("No entry holds: {}", literal))?;
            write_output(io.output.as_deref(), &path.to_string())?;
        }
        Commands::Parent { io, path } => {
            let tree = load(&parser, &io)?;
            let parent = blk_core::closest_parent_path(&tree, &path)
                .with_context(|| format!("No parent block for path: {}", path))?;
            write_output(io.output.as_deref(), &parent.to_string())?;
        }
        Commands::Check { io } => {
            let tree = load(&parser, &io)?;
            let (entries, blocks) = count(&tree);
            write_output(
                io.output.as_deref(),
                &format!("entries: {}\nblocks: {}", entries, blocks),
            )?;
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with document output.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn style(indices: bool) -> PathStyle {
    if indices {
        PathStyle::Indices
    } else {
        PathStyle::Keys
    }
}

fn load(parser: &BlkParser, io: &IoArgs) -> Result<Tree> {
    let text = read_input(io.input.as_deref())?;
    let source = io.input.as_deref().unwrap_or("<stdin>");
    let tree = parser
        .parse(&text)
        .with_context(|| format!("Failed to parse BLK from {}", source))?;
    debug!(source, entries = tree.len(), "loaded document");
    Ok(tree)
}

/// Total entries and how many of them are blocks, at every depth.
fn count(block: &Block) -> (usize, usize) {
    block.iter().fold((0, 0), |(entries, blocks), entry| match &entry.value {
        Value::Block(child) => {
            let (e, b) = count(child);
            (entries + 1 + e, blocks + 1 + b)
        }
        _ => (entries + 1, blocks),
    })
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Write `content` followed by a newline, unless it is empty.
fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    let content = if content.is_empty() {
        String::new()
    } else {
        format!("{}\n", content)
    };
    match path {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
