// ghostedit - re-edit a sent chat message with no edited mark
//
// The browser's outgoing "send message" request is captured from the
// clipboard, its nonce replaced with the id of an existing message, and the
// result replayed: the remote service treats the send as an edit of that
// message, so the usual send-then-edit marker never appears.
//
// Architecture:
// - Parser: turns the captured fetch snippet into a validated record
// - Rewrite: splices in the replacement content and id, producing a console
//   snippet and a dispatchable payload
// - Dispatch: optionally POSTs the rewritten request (reqwest)
// - Session: interactive state machine gluing the stages to the clipboard

mod buffer;
mod cli;
mod config;
mod dispatch;
mod parser;
mod rewrite;
mod session;
mod startup;
mod util;

use anyhow::Result;
use buffer::ClipboardBuffer;
use config::Config;
use dispatch::Dispatcher;
use session::{Session, StdioPrompter};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --path)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // Precedence: RUST_LOG env var > config file > default "info"
    // Logs go to stderr so they never interleave with the prompts on stdout
    let default_filter = format!("ghostedit={}", config.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    startup::print_banner(&config);

    let dispatcher = Dispatcher::new(Duration::from_secs(config.timeout_secs))?;
    let mut buffer = ClipboardBuffer;
    let mut prompter = StdioPrompter;

    let mut session = Session::new(&config, &dispatcher, &mut buffer, &mut prompter);
    session.run().await
}
