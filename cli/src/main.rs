use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use items_core::{AirTableConfig, Item, ItemRepo};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Read, create and soft-delete items stored in AirTable"
)]
struct Cli {
    #[arg(
        short,
        long,
        env = "ITEMS_CONFIG",
        value_name = "FILE",
        help = "TOML file with AirTable settings; AIRTABLE_* variables override it"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List items
    List {
        #[arg(long, help = "Include soft-deleted items")]
        include_deleted: bool,
    },
    /// Show the active item with this id
    Get { id: String },
    /// Count items updated in the last hour
    Stats,
    /// Soft-delete an item
    Delete { id: String },
    /// Create an item
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_name = "NUMBER")]
        phone: String,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AirTableConfig::load(cli.config.as_deref()).context("loading AirTable settings")?;
    tracing::debug!(base = %config.base_id, table = %config.table, "configuration loaded");
    let repo = ItemRepo::from_config(&config)?;

    let output = match cli.command {
        Command::List { include_deleted } => {
            serde_json::to_value(repo.get_rows(include_deleted).await?)?
        }
        Command::Get { id } => serde_json::to_value(repo.get_row_by_id(&id).await?)?,
        Command::Stats => serde_json::to_value(repo.get_item_statistics().await?)?,
        Command::Delete { id } => {
            repo.delete_item(&id).await?;
            serde_json::json!({ "deleted": id })
        }
        Command::Create { name, phone } => {
            serde_json::to_value(repo.post_item(Item::new(name, phone)).await?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create() {
        let cli = Cli::parse_from(["items", "create", "--name", "Jordan", "--phone", "780-246-8060"]);
        match cli.command {
            Command::Create { name, phone } => {
                assert_eq!(name, "Jordan");
                assert_eq!(phone, "780-246-8060");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_list_flag() {
        let cli = Cli::parse_from(["items", "list", "--include-deleted"]);
        assert!(matches!(cli.command, Command::List { include_deleted: true }));
    }
}
