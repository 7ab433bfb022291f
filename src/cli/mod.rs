pub mod commands;

use bytes::Bytes;
use std::io::{self, Write};
use std::path::Path;

use crate::ask::{ChatRole, ChatTurn};
use crate::cli::commands::{Commands, FilesAction};
use crate::services::Services;

/// Runs every subcommand except `serve`, which `main` handles by starting
/// the HTTP server. Returns the process exit code.
pub async fn run_cli(command: Commands, services: Services) -> i32 {
    match command {
        Commands::Serve => unreachable!("serve is dispatched by main"),
        Commands::Files { action: FilesAction::List } => match services.store.list().await {
            Ok(docs) => {
                if docs.is_empty() {
                    println!("No documents uploaded.");
                } else {
                    println!("{:<20} | {:>12} | {}", "Modified", "Bytes", "ID");
                    println!("{:-<20}-+-{:->12}-+-{:-<40}", "", "", "");
                    for d in docs {
                        println!("{:<20} | {:>12} | {}", d.modified.format("%Y-%m-%d %H:%M:%S"), d.size, d.id);
                    }
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Upload { path } => {
            let original_name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = match tokio::fs::read(&path).await {
                Ok(c) => Bytes::from(c),
                Err(e) => {
                    eprintln!("Failed to read {}: {}", path, e);
                    return 1;
                }
            };
            match services.uploads.store(&original_name, content).await {
                Ok(uploaded) => {
                    println!("{}", uploaded.id);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::Ask { files, question } => {
            println!("{}", services.ask.ask(&question, &files).await);
            0
        }
        Commands::Chat { files } => match run_repl(&services, &files).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Terminal error: {}", e);
                1
            }
        },
    }
}

async fn run_repl(services: &Services, files: &[String]) -> io::Result<()> {
    let mut transcript: Vec<ChatTurn> = Vec::new();

    println!("--- AskDocs Terminal Chat ---");
    println!("Documents: {}", files.join(", "));
    println!("Type /history to reprint the conversation, /exit to quit.");
    println!("-----------------------------");

    loop {
        print!("\nYou> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let text = input.trim();

        if text.is_empty() { continue; }
        if text == "/exit" || text == "/quit" { break; }
        if text == "/history" {
            print_transcript(&transcript);
            continue;
        }

        transcript.push(ChatTurn::user(text));
        let answer = services.ask.ask(text, files).await;
        println!("AskDocs> {}", answer);
        transcript.push(ChatTurn::assistant(answer));
    }

    Ok(())
}

fn print_transcript(transcript: &[ChatTurn]) {
    for turn in transcript {
        let who = match turn.role {
            ChatRole::User => "You",
            ChatRole::Assistant => "AskDocs",
        };
        println!("[{}]: {}", who, turn.content);
        println!("---");
    }
}
