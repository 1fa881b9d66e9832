use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use docuchat::config;
use docuchat::pipeline::chat::ChatSession;
use docuchat::pipeline::context;
use docuchat::pipeline::gemini::GeminiClient;
use docuchat::pipeline::ingest::{self, RawFile};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let client = match GeminiClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let mut session = ChatSession::new();
    println!("{}", session.turns()[0].text);
    println!("Commands: /add <file>..., /remove <name|id>, /list, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/quit") | Some("/exit") => break,
            Some("/add") => {
                let files: Vec<RawFile> = line
                    .split_whitespace()
                    .skip(1)
                    .map(RawFile::from_path)
                    .collect();
                if files.is_empty() {
                    println!("usage: /add <file>...");
                    continue;
                }
                let given = files.len();
                let documents = ingest::ingest(files).await;
                println!("added {} of {} file(s)", documents.len(), given);
                session.add_documents(documents);
            }
            Some("/remove") => {
                let target = line["/remove".len()..].trim();
                if target.is_empty() {
                    println!("usage: /remove <name|id>");
                    continue;
                }
                let id = target
                    .parse::<Uuid>()
                    .ok()
                    .or_else(|| {
                        session
                            .documents()
                            .iter()
                            .find(|d| d.name == target)
                            .map(|d| d.id)
                    });
                match id {
                    Some(id) if session.remove_document(id) => println!("removed {target}"),
                    _ => println!("no document matching {target}"),
                }
            }
            Some("/list") => {
                if session.documents().is_empty() {
                    println!("no documents loaded");
                } else {
                    for doc in session.documents() {
                        println!(
                            "  {}  {} ({:.1} KB)",
                            doc.id,
                            doc.name,
                            doc.size_bytes as f64 / 1024.0
                        );
                    }
                    println!(
                        "context: ~{} of {} tokens",
                        context::estimate_tokens(session.documents()),
                        context::MODEL_INPUT_TOKEN_LIMIT
                    );
                }
            }
            Some("/reset") => {
                if session.reset() {
                    println!("conversation cleared");
                } else {
                    println!("cannot reset while a request is in flight");
                }
            }
            _ => {
                if let Some(turn) = session.send(line, &client).await {
                    println!("{}", turn.text);
                }
            }
        }
    }
}
