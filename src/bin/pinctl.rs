use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use profile_pins::client::PinClient;
use profile_pins::model::{PinList, PinnedRepository, RepoId};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "pinctl")]
#[command(about = "Manage pinned repositories on a running pin service")]
struct Cli {
    #[arg(short, long, env = "PINS_URL", default_value = "http://localhost:8787")]
    url: String,
    #[arg(short, long)]
    pretty: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the pinned repositories of a user
    List { username: String },
    /// Pin a repository, given as a JSON object or a bare id
    Pin { username: String, repo: String },
    /// Unpin a repository by id
    Unpin { username: String, id: String },
    /// Move the given ids to the front, in order
    Reorder {
        username: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn parse_repo(raw: &str) -> Result<PinnedRepository> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed).context("repo is not valid JSON")?;
        return Ok(PinnedRepository::from_json(Some(value))?);
    }
    Ok(PinnedRepository::new(RepoId::parse(trimmed)?))
}

fn parse_ids(raw: &[String]) -> Result<Vec<RepoId>> {
    raw.iter()
        .map(|id| RepoId::parse(id).with_context(|| format!("invalid repo id {:?}", id)))
        .collect()
}

fn render(pins: &PinList, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(pins)?)
    } else {
        Ok(serde_json::to_string(pins)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = PinClient::new(&cli.url)?;

    let pins = match &cli.command {
        Command::List { username } => client.pinned(username).await?,
        Command::Pin { username, repo } => client.pin(username, &parse_repo(repo)?).await?,
        Command::Unpin { username, id } => client.unpin(username, &RepoId::parse(id)?).await?,
        Command::Reorder { username, ids } => client.reorder(username, &parse_ids(ids)?).await?,
    };

    println!("{}", render(&pins, cli.pretty)?);
    Ok(())
}
