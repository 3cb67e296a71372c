// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use gemchat_core::chat::{ChatPage, DeliveryState, PageView, SendOutcome, TranscriptEntry};
use gemchat_core::models::message::Role;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::ApiClient;

mod cli;
mod client;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        command => {
            let (Some(email), Some(password)) = (args.email.as_deref(), args.password.as_deref())
            else {
                return Err(Error::Custom(
                    "credentials required: pass --email/--password \
                     or set GEMCHAT_EMAIL/GEMCHAT_PASSWORD"
                        .into(),
                ));
            };
            let (client, identity) = ApiClient::login(&args.server, email, password).await?;
            let mut page = ChatPage::new(Some(identity));
            run_command(command, &mut page, &client).await?;
        }
    }

    Ok(())
}

async fn run_command(command: Commands, page: &mut ChatPage, client: &ApiClient) -> Result<()> {
    match command {
        Commands::Chat => {
            page.load(client).await?;
            repl(page, client).await?;
        }
        Commands::Send { message } => {
            page.set_input(message);
            let before = page.transcript().len();
            let outcome = page.send(client, client).await;
            print_entries(&page.transcript().entries()[before..]);
            if let SendOutcome::RelayFailed { .. } = outcome {
                return Err(Error::Custom("relay failed".into()));
            }
        }
        Commands::History => {
            page.load(client).await?;
            print_entries(page.transcript().entries());
        }
        Commands::Clear => {
            let removed = page.clear(client).await?;
            println!("Removed {removed} messages.");
        }
        Commands::Version => {}
    }
    Ok(())
}

async fn repl(page: &mut ChatPage, client: &ApiClient) -> Result<()> {
    if let PageView::Chat {
        greeting, entries, ..
    } = page.view()
    {
        println!("{greeting}");
        print_entries(entries);
    }
    println!("Ask Gemini anything... (/clear to empty the chat, /quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => match page.clear(client).await {
                Ok(_) => println!("Chat cleared."),
                Err(e) => log::warn!("{e}"),
            },
            _ => {
                page.set_input(line);
                let before = page.transcript().len();
                println!("Gemini is typing...");
                if page.send(client, client).await == SendOutcome::Ignored {
                    continue;
                }
                // The user entry was just typed; show only its state if it failed.
                for entry in &page.transcript().entries()[before..] {
                    if entry.role == Role::User && entry.state != DeliveryState::Failed {
                        continue;
                    }
                    print_entry(entry);
                }
            }
        }
    }
    Ok(())
}

fn print_entries(entries: &[TranscriptEntry]) {
    for entry in entries {
        print_entry(entry);
    }
}

fn print_entry(entry: &TranscriptEntry) {
    let who = match entry.role {
        Role::User => "you",
        Role::Assistant => "gemini",
    };
    let note = match entry.state {
        DeliveryState::Failed => " (not saved)",
        DeliveryState::Pending | DeliveryState::Confirmed => "",
    };
    println!("{who}> {}{note}", entry.content);
}
