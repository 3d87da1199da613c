//! tlm-board - terminal host for the Board Controller
//!
//! Each invocation restores the saved board, runs one operation and exits;
//! the controller saves after every change.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tlm_board::dnd::{grid_boxes, DragPayload, DragSession};
use tlm_board::render::{candidate_cards, render};
use tlm_board::search::{select_candidate, GatewayClient, DEFAULT_GATEWAY_URL};
use tlm_board::upload::ingest_files;
use tlm_board::{Board, BoardController, BucketKey, FileStorage, Patch};
use tlm_common::config::{default_data_dir, load_config};
use tlm_common::logging::init_tracing;
use tlm_common::MediaType;

/// Rendered item width used to lay out rows for `drop`
const CELL_WIDTH: f64 = 100.0;
const CELL_GAP: f64 = 8.0;

#[derive(Parser, Debug)]
#[command(name = "tlm-board")]
#[command(about = "Tier list board: rank uploaded images and search results")]
#[command(version)]
struct Args {
    /// Config file (overrides TLM_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the saved board
    #[arg(long, env = "TLM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Search gateway base URL
    #[arg(long, env = "TLM_GATEWAY_URL")]
    gateway: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board
    Show {
        /// Print the view model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add image files to a bucket
    Upload {
        #[arg(short, long, default_value = "unassigned")]
        bucket: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move an item to a bucket
    Move {
        item: String,
        to: String,
        /// Insert before this item (default: append)
        #[arg(long)]
        before: Option<String>,
    },
    /// Drop an item into a bucket at a horizontal pointer position
    Drop {
        item: String,
        to: String,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
    },
    /// Remove an item
    Remove { item: String },
    /// Manage tiers
    Tier {
        #[command(subcommand)]
        action: TierCommand,
    },
    /// Search a media source through the gateway
    Search {
        media: MediaType,
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Search and add one result to a bucket
    Pick {
        media: MediaType,
        query: String,
        /// 1-based position in the result list
        #[arg(long, default_value = "1")]
        index: usize,
        #[arg(short, long, default_value = "unassigned")]
        bucket: String,
    },
    /// Empty every bucket
    Clear,
    /// Print the saved board snapshot
    Export,
    /// Replace the board with a snapshot file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum TierCommand {
    Add { name: String },
    Rename { tier: String, name: String },
    /// Set a color, or step through the palette when none is given
    Recolor { tier: String, color: Option<String> },
    Delete { tier: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&loaded.config.logging.level);
    loaded.log_source();
    let config = loaded.config;

    let data_dir = args
        .data_dir
        .or(config.board.data_dir)
        .unwrap_or_else(default_data_dir);
    let gateway_url = args
        .gateway
        .or(config.board.gateway_url)
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
    debug!(data_dir = %data_dir.display(), %gateway_url, "Board host configured");

    let mut controller = BoardController::restore(FileStorage::new(&data_dir));

    match args.command {
        Command::Show { json } => {
            let view = render(controller.board());
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                for row in &view.rows {
                    let labels: Vec<&str> = row.items.iter().map(|i| i.label.as_str()).collect();
                    println!("{:<20} [{}] {}", row.label, row.tier_id, labels.join(", "));
                }
                let pool: Vec<&str> = view
                    .unassigned
                    .items
                    .iter()
                    .map(|i| i.label.as_str())
                    .collect();
                if view.unassigned.show_drop_hint {
                    println!("{:<20} (drop images here)", "Unassigned");
                } else {
                    println!("{:<20} {}", "Unassigned", pool.join(", "));
                }
                println!("{}", view.status_line());
            }
        }
        Command::Upload { bucket, files } => {
            let bucket = BucketKey::from(bucket);
            let report = ingest_files(&mut controller, &bucket, &files).await?;
            for path in &report.skipped {
                println!("skipped (not an image): {}", path.display());
            }
            for path in &report.failed {
                println!("failed to read: {}", path.display());
            }
            println!("added {} image(s) to {}", report.added.len(), bucket);
        }
        Command::Move { item, to, before } => {
            let (from, _) = controller
                .board()
                .locate(&item)
                .ok_or_else(|| anyhow!("No item with id {}", item))?;
            let to = known_bucket(controller.board(), to)?;
            let patches = controller.move_item(&item, &from, &to, before.as_deref());
            report_patches(&patches, "moved");
        }
        Command::Drop { item, to, x } => {
            let (from, _) = controller
                .board()
                .locate(&item)
                .ok_or_else(|| anyhow!("No item with id {}", item))?;
            let target = known_bucket(controller.board(), to)?;
            let ids: Vec<String> = controller
                .board()
                .bucket(&target)
                .unwrap_or_default()
                .iter()
                .map(|i| i.id.clone())
                .collect();
            let boxes = grid_boxes(&ids, 0.0, CELL_WIDTH, CELL_GAP);

            let request = DragSession::begin(DragPayload::new(item, from)).drop(target, &boxes, x);
            let patches = request.apply(&mut controller);
            report_patches(&patches, "dropped");
        }
        Command::Remove { item } => {
            let patches = controller.remove_item(&item);
            report_patches(&patches, "removed");
        }
        Command::Tier { action } => run_tier_command(&mut controller, action)?,
        Command::Search { media, query, limit } => {
            let client = GatewayClient::new(gateway_url)?;
            let candidates = client.search(media, &query, limit).await?;
            println!("{}", media.search_title());
            match candidate_cards(media, &candidates) {
                Ok(cards) => {
                    for (n, card) in cards.iter().enumerate() {
                        println!("{:>3}. {} [{}]", n + 1, card.title, card.id);
                        println!("     {}", card.description);
                    }
                }
                Err(message) => println!("{}", message),
            }
        }
        Command::Pick {
            media,
            query,
            index,
            bucket,
        } => {
            let client = GatewayClient::new(gateway_url)?;
            let candidates = client.search(media, &query, None).await?;
            let candidate = index
                .checked_sub(1)
                .and_then(|i| candidates.get(i))
                .ok_or_else(|| anyhow!("No result #{} ({} found)", index, candidates.len()))?;
            let patches =
                select_candidate(&mut controller, &BucketKey::from(bucket), media, candidate)?;
            report_patches(&patches, "added");
        }
        Command::Clear => {
            let patches = controller.clear_all();
            report_patches(&patches, "cleared");
        }
        Command::Export => println!("{}", controller.serialize()?),
        Command::Import { file } => {
            let blob = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            controller
                .import(&blob)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            info!(items = controller.item_count(), "Board imported");
            println!("imported {} item(s)", controller.item_count());
        }
    }

    Ok(())
}

fn run_tier_command(
    controller: &mut BoardController<FileStorage>,
    action: TierCommand,
) -> Result<()> {
    match action {
        TierCommand::Add { name } => {
            let (id, _) = controller.add_tier(&name)?;
            println!("added tier {}", id);
        }
        TierCommand::Rename { tier, name } => {
            let patches = controller.rename_tier(&tier, &name)?;
            report_patches(&patches, "renamed");
        }
        TierCommand::Recolor { tier, color } => {
            let patches = match color {
                Some(color) => controller.recolor_tier(&tier, &color)?,
                None => controller.cycle_tier_color(&tier)?,
            };
            report_patches(&patches, "recolored");
        }
        TierCommand::Delete { tier } => {
            let items = controller
                .board()
                .bucket(&BucketKey::from(tier.as_str()))
                .map_or(0, <[_]>::len);
            if BucketKey::from(tier.as_str()).is_unassigned() {
                bail!("The unassigned pool cannot be deleted");
            }
            controller.delete_tier(&tier)?;
            println!("deleted tier {} ({} item(s) moved to unassigned)", tier, items);
        }
    }
    Ok(())
}

fn report_patches(patches: &[Patch], verb: &str) {
    if patches.is_empty() {
        println!("nothing changed");
    } else {
        println!("{}", verb);
    }
}

/// Bucket key typed by the user, rejected when the board has no such bucket
fn known_bucket(board: &Board, key: String) -> Result<BucketKey> {
    let key = BucketKey::from(key);
    if !board.has_bucket(&key) {
        bail!("Unknown bucket {}", key);
    }
    Ok(key)
}
