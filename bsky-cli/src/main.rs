use bsky_agent::{
    load_thread, Config, XrpcClient, DEFAULT_DEPTH, DEFAULT_PARENT_HEIGHT, DEFAULT_SERVICE,
};
use bsky_msg::PostView;
use bsky_ref::{ActorRef, RefError};
use bsky_thread::{FlatThread, Role};
use clap::Parser;
use std::io::{self, Write};
use thiserror::Error as ThisError;
use tracing_subscriber::EnvFilter;

/// Print a Bluesky post thread as the flat list a thread screen shows.
#[derive(Debug, Parser)]
#[command(name = "bsky-cli", version)]
struct Args {
    /// Handle or DID of the post's author
    actor: String,
    /// Record key of the post
    rkey: String,
    /// Print the flattened thread as JSON
    #[arg(long)]
    json: bool,
    #[arg(long, env = "BSKY_SERVICE", default_value = DEFAULT_SERVICE)]
    service: String,
    /// Levels of replies to fetch
    #[arg(long, env = "BSKY_DEPTH", default_value_t = DEFAULT_DEPTH)]
    depth: u16,
    /// Ancestors to fetch
    #[arg(long, env = "BSKY_PARENT_HEIGHT", default_value_t = DEFAULT_PARENT_HEIGHT)]
    parent_height: u16,
}

#[derive(Debug, ThisError)]
enum Error {
    #[error("Invalid actor, cause: {0}")]
    Actor(#[source] RefError),
    #[error("Invalid service url, cause: {0}")]
    Service(#[source] url::ParseError),
    #[error(transparent)]
    Agent(#[from] bsky_agent::Error),
    #[error("Failed to serialize JSON to string: {0}")]
    JsonToString(#[source] serde_json::Error),
    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let actor = ActorRef::from_string(args.actor).map_err(Error::Actor)?;
    let config = Config {
        depth: args.depth,
        parent_height: args.parent_height,
        ..Config::default()
    }
    .with_service(&args.service)
    .map_err(Error::Service)?;

    let client = XrpcClient::new(config)?;
    let thread = load_thread(&client, &client, &actor, &args.rkey).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let json = serde_json::to_string_pretty(&thread).map_err(Error::JsonToString)?;
        writeln!(out, "{}", json).map_err(Error::Write)?;
    } else {
        write_thread(&mut out, &thread).map_err(Error::Write)?;
    }

    Ok(())
}

fn write_thread(out: &mut impl Write, thread: &FlatThread<PostView>) -> io::Result<()> {
    for (index, entry) in thread.entries.iter().enumerate() {
        let marker = match entry.role {
            Role::Focal => ">",
            _ if thread.is_continuation(index) => "|",
            _ => " ",
        };
        let text = entry
            .post
            .text()
            .and_then(|text| text.lines().next())
            .unwrap_or("");
        writeln!(out, "{} @{}: {}", marker, entry.post.author.handle, text)?;
    }
    writeln!(out, "anchor: {}", thread.anchor_index)
}
