//! Agent console for the suggestion relay.
//!
//! Opens a channel to the relay and shows the suggestions pushed for the
//! conversation being handled.
//!
//! Commands:
//! - `/start <conversation-id>`: start handling a conversation
//! - `/end`: end the current conversation
//! - `/quit`: exit
//! - any other line: send it as a test customer message
//!
//! Run with:
//! ```not_rust
//! cargo run --bin madoguchi-agent
//! cargo run --bin madoguchi-agent -- --relay-url http://127.0.0.1:8080 \
//!     --channel-url ws://127.0.0.1:8080/ws --transcript-url http://127.0.0.1:9100
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use madoguchi_client::{
    config::AgentConfig, formatter::SessionFormatter, session::AgentSession,
    ui::redisplay_prompt,
};
use madoguchi_shared::{logger::setup_logger, time::now_millis};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{mpsc, watch};

#[derive(Parser, Debug)]
#[command(name = "madoguchi-agent")]
#[command(about = "Agent console showing AI answer suggestions", long_about = None)]
struct Args {
    /// Base URL of the relay's HTTP API
    #[arg(
        short = 'r',
        long,
        env = "MADOGUCHI_RELAY_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    relay_url: String,

    /// WebSocket URL of the relay's channel endpoint
    #[arg(
        short = 'u',
        long,
        env = "MADOGUCHI_CHANNEL_URL",
        default_value = "ws://127.0.0.1:8080/ws"
    )]
    channel_url: String,

    /// Base URL of the transcript API
    #[arg(
        short = 't',
        long,
        env = "MADOGUCHI_TRANSCRIPT_URL",
        default_value = "http://127.0.0.1:9100"
    )]
    transcript_url: String,

    /// Transcript poll interval in milliseconds
    #[arg(long, env = "MADOGUCHI_POLL_INTERVAL_MS", default_value = "2000")]
    poll_interval_ms: u64,

    /// Conversation to start right away
    #[arg(short = 'c', long)]
    conversation: Option<String>,
}

impl From<&Args> for AgentConfig {
    fn from(args: &Args) -> Self {
        Self {
            relay_url: args.relay_url.clone(),
            channel_url: args.channel_url.clone(),
            transcript_url: args.transcript_url.clone(),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            ..AgentConfig::default()
        }
    }
}

/// A line typed at the console.
enum Command {
    Start(String),
    End,
    Quit,
    TestMessage(String),
}

fn parse_command(line: &str) -> Command {
    match line.split_once(' ') {
        Some(("/start", id)) => Command::Start(id.trim().to_string()),
        _ if line == "/start" => Command::Start(String::new()),
        _ if line == "/end" => Command::End,
        _ if line == "/quit" => Command::Quit,
        _ => Command::TestMessage(line.to_string()),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = AgentConfig::from(&args);

    let session = match AgentSession::connect(&config) {
        Ok(session) => Arc::new(session),
        Err(e) => {
            tracing::error!("Failed to build agent session: {}", e);
            std::process::exit(1);
        }
    };
    session.open().await;

    let (prompt_tx, prompt_rx) = watch::channel(SessionFormatter::prompt(None));
    spawn_display(&session, prompt_rx.clone());

    if let Some(conversation_id) = args.conversation.as_deref() {
        start(&session, conversation_id, &prompt_tx).await;
    }

    println!("\nType /start <conversation-id> to handle a conversation, /quit to exit.\n");

    // Spawn a blocking thread for rustyline (synchronous readline)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            let prompt = prompt_rx.borrow().clone();
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        match parse_command(&line) {
            Command::Start(conversation_id) => start(&session, &conversation_id, &prompt_tx).await,
            Command::End => {
                if let Some(conversation_id) = session.end_conversation().await {
                    print!("{}", SessionFormatter::format_conversation_ended(&conversation_id));
                }
                prompt_tx.send_replace(SessionFormatter::prompt(None));
            }
            Command::Quit => break,
            Command::TestMessage(text) => match session.submit_test_message(&text).await {
                Ok(()) => print!("{}", SessionFormatter::format_test_message_sent(now_millis())),
                Err(e) => println!("{}", e),
            },
        }
    }

    session.shutdown().await;
    tracing::info!("Agent session closed");
}

async fn start(session: &AgentSession, conversation_id: &str, prompt_tx: &watch::Sender<String>) {
    match session.start_conversation(conversation_id).await {
        Ok(streaming_enabled) => {
            print!(
                "{}",
                SessionFormatter::format_conversation_started(conversation_id, streaming_enabled)
            );
            prompt_tx.send_replace(SessionFormatter::prompt(Some(conversation_id)));
        }
        Err(e) => println!("{}", e),
    }
}

/// Print suggestions and channel state changes as they arrive.
fn spawn_display(session: &AgentSession, prompt_rx: watch::Receiver<String>) {
    let mut suggestions = session.suggestions();
    let mut states = session.channel_state();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = suggestions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let suggestion = suggestions.borrow_and_update().clone();
                    if let Some(suggestion) = suggestion {
                        print!("{}", SessionFormatter::format_suggestion(&suggestion, now_millis()));
                        redisplay_prompt(&prompt_rx.borrow());
                    }
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *states.borrow_and_update();
                    print!("{}", SessionFormatter::format_channel_state(state));
                    redisplay_prompt(&prompt_rx.borrow());
                }
            }
        }
    });
}
