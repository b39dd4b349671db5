//! `lifechat chat`: log one message, or chat interactively.

use lifechat_agent::{ChatReply, build_services, spawn_activity_log};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    super::require_api_key(&config)?;
    let services = build_services(&config).await?;
    spawn_activity_log(&services.event_bus);

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = services.journal.log_chat(&msg).await;
        eprint!("\r              \r");
        println!("{}", serde_json::to_string_pretty(&reply?)?);
        return Ok(());
    }

    println!();
    println!("  LifeChat: tell me about your day.");
    println!("  Provider: {} ({})", config.provider, config.model);
    println!("  Type 'exit' or press Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match services.journal.log_chat(line).await {
            Ok(reply) => print_reply(&reply),
            Err(e) => eprintln!("  [Error] {e}\n"),
        }
    }

    println!("\n  Goodbye!\n");
    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!();
    for line in reply.reply.lines() {
        println!("  LifeChat > {line}");
    }
    for event in &reply.created_events {
        println!(
            "    + event   {} ({} to {})",
            event.name,
            event.start_time.format("%Y-%m-%d %H:%M"),
            event.end_time.format("%H:%M")
        );
    }
    for feeling in &reply.feelings {
        println!("    + feeling {} ({}/10)", feeling.feelings.join(", "), feeling.score);
    }
    println!();
}
