use std::io::{self, Write};

use anyhow::Result;
use confab_client::{
    ChatClient, ChatClientConfig, ChatKind, ChatMessage, DEFAULT_HUB_URL, TypingStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn print_help() {
    println!("Commands:");
    println!("  /typing        - Announce that you are typing");
    println!("  /quit          - Exit");
    println!("  <message>      - Send message to the lobby");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let hub_url = std::env::var("CONFAB_HUB").unwrap_or_else(|_| DEFAULT_HUB_URL.to_string());

    let username = prompt_username()?;
    if username.is_empty() {
        println!("Username required");
        return Ok(());
    }

    let client = ChatClient::new(ChatClientConfig {
        hub_url,
        ..ChatClientConfig::default()
    });

    client.set_connected_handler(|| {
        println!("Connected. Type /help for commands.");
    });
    client.set_receive_message_handler(|message| {
        println!("{}: {}", message.sender, message.content);
    });
    client.set_announce_user_handler(|user, joined| {
        println!("* {} {}", user, if joined { "joined" } else { "left" });
    });
    client.set_typing_status_handler(|status| {
        if status.is_typing {
            println!("* {} is typing...", status.user);
        }
    });
    client.set_send_message_handler(|message| {
        println!("(you) {}", message.content);
    });

    client.start(&username).await;
    if !client.is_connected() {
        println!("Could not reach the hub");
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/help" => print_help(),
            "/quit" | "/exit" => break,
            "/typing" => {
                client.send_typing_status(TypingStatus {
                    user: username.clone(),
                    kind: ChatKind::Group,
                    participants: Vec::new(),
                    is_typing: true,
                });
            }
            _ => {
                client.send_message(ChatMessage {
                    sender: username.clone(),
                    kind: ChatKind::Group,
                    participants: Vec::new(),
                    content: line.to_string(),
                });
            }
        }
    }

    client.stop();
    Ok(())
}
