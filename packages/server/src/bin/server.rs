//! Suggestion relay server.
//!
//! Accepts agent sessions over WebSocket, takes inbound conversation events
//! over HTTP and fans generated suggestions out to every session subscribed to
//! the conversation.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin madoguchi-server
//! cargo run --bin madoguchi-server -- --host 0.0.0.0 --port 3000 \
//!     --generator-url http://127.0.0.1:9000/suggestions
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use madoguchi_server::{
    config::RelayConfig,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryConnectionRegistry,
        streaming::HttpStreamingActivator, suggestion::HttpSuggestionGenerator,
    },
    ui::{Components, Server},
};
use madoguchi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "madoguchi-server")]
#[command(about = "Relays AI-generated answer suggestions to agent sessions", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "MADOGUCHI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "MADOGUCHI_PORT", default_value = "8080")]
    port: u16,

    /// Suggestion generator endpoint
    #[arg(
        long,
        env = "MADOGUCHI_GENERATOR_URL",
        default_value = "http://127.0.0.1:9000/suggestions"
    )]
    generator_url: String,

    /// Suggestion generator timeout in seconds
    #[arg(long, env = "MADOGUCHI_GENERATOR_TIMEOUT", default_value = "10")]
    generator_timeout: u64,

    /// Streaming-enablement endpoint of the chat platform
    #[arg(
        long,
        env = "MADOGUCHI_STREAMING_URL",
        default_value = "http://127.0.0.1:9000/streaming"
    )]
    streaming_url: String,

    /// Streaming-enablement timeout in seconds
    #[arg(long, env = "MADOGUCHI_STREAMING_TIMEOUT", default_value = "5")]
    streaming_timeout: u64,

    /// Idle seconds before a per-conversation relay worker exits
    #[arg(long, env = "MADOGUCHI_WORKER_IDLE", default_value = "60")]
    worker_idle: u64,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            generator_url: args.generator_url,
            generator_timeout: Duration::from_secs(args.generator_timeout),
            streaming_url: args.streaming_url,
            streaming_timeout: Duration::from_secs(args.streaming_timeout),
            worker_idle_timeout: Duration::from_secs(args.worker_idle),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = RelayConfig::from(Args::parse());

    // Initialize dependencies in order:
    // 1. Registry
    // 2. MessagePusher
    // 3. External collaborators
    // 4. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemoryConnectionRegistry::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create HTTP clients for the generator and the streaming trigger
    let generator =
        match HttpSuggestionGenerator::new(config.generator_url.clone(), config.generator_timeout)
        {
            Ok(generator) => Arc::new(generator),
            Err(e) => {
                tracing::error!("Failed to build suggestion client: {}", e);
                std::process::exit(1);
            }
        };
    let streaming_activator =
        match HttpStreamingActivator::new(config.streaming_url.clone(), config.streaming_timeout) {
            Ok(activator) => Arc::new(activator),
            Err(e) => {
                tracing::error!("Failed to build streaming client: {}", e);
                std::process::exit(1);
            }
        };

    // 4. Create and run the server
    let server = Server::new(
        &config,
        Components {
            registry,
            message_pusher,
            generator,
            streaming_activator,
            clock: Arc::new(SystemClock),
        },
    );
    if let Err(e) = server.run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
