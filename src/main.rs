use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use cdac_chatbot::clients::{HttpCompletionClient, HttpIngestionClient};
use cdac_chatbot::{
    AlertNotice, ChatConfig, CompletionClient, ConversationController, Document, IngestionClient,
    SendOutcome,
};

const HELP: &str = "\
Type a message and press Enter to chat.
  /upload <path>     send a document to the ingestion service
  /download [path]   save the transcript as a spreadsheet
  /help              show this help
  /quit              leave";

enum Command<'a> {
    Say(&'a str),
    Upload(&'a str),
    Download(Option<&'a str>),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };
    match head {
        "/upload" => Command::Upload(rest),
        "/download" => Command::Download((!rest.is_empty()).then_some(rest)),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Say(line),
    }
}

async fn read_document(path: &str) -> anyhow::Result<Document> {
    let bytes = tokio::fs::read(path).await.with_context(|| format!("cannot read {path}"))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(Document::new(file_name, bytes))
}

async fn say<C: CompletionClient, I: IngestionClient>(
    controller: &mut ConversationController<C, I>,
    text: &str,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    if !text.trim().is_empty() {
        stdout.write_all(b"Bot typing...\n").await?;
        stdout.flush().await?;
    }

    match controller.send_user_message(text).await {
        SendOutcome::Replied => {
            if let Some(reply) = controller.transcript().last() {
                println!("bot> {}", reply.text());
            }
        }
        SendOutcome::Failed(e) => println!("(no reply: {e})"),
        SendOutcome::Rejected(e) if e.is_busy() => {
            println!("(still waiting for the previous reply)")
        }
        SendOutcome::Rejected(e) => println!("({e})"),
        SendOutcome::Ignored | SendOutcome::Discarded => {}
    }
    Ok(())
}

/// Writes the transcript spreadsheet to `path`; returns the number of rows saved.
async fn save_export<C: CompletionClient, I: IngestionClient>(
    controller: &ConversationController<C, I>,
    path: &str,
) -> anyhow::Result<usize> {
    let bytes = controller.export_spreadsheet()?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("cannot write {path}"))?;
    Ok(controller.transcript().len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdac_chatbot=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Wiring ────────────────────────────────────────────────────────────────
    let config = ChatConfig::from_env()?;
    let completion = HttpCompletionClient::from_config(&config)?;
    let ingestion = HttpIngestionClient::from_config(&config)?;
    info!(completion = completion.url(), ingestion = ingestion.url(), "clients ready");

    let mut controller = ConversationController::new(completion, ingestion);
    for message in controller.transcript().messages() {
        println!("{}> {}", message.sender(), message.text());
    }
    println!("{HELP}");

    // ── Input loop ────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Say(text) => say(&mut controller, text).await?,
            Command::Upload("") => println!("usage: /upload <path>"),
            Command::Upload(path) => match read_document(path).await {
                Ok(document) => {
                    let outcome = controller.upload_document(&document).await;
                    println!("[{}]", AlertNotice::for_outcome(outcome).message);
                }
                Err(e) => println!("({e:#})"),
            },
            Command::Download(path) => {
                let path = path.unwrap_or(config.export_path.as_str());
                match save_export(&controller, path).await {
                    Ok(saved) => println!("saved {saved} messages to {path}"),
                    Err(e) => println!("({e:#})"),
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}
