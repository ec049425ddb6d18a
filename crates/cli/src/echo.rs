use owo_colors::OwoColorize;
use pagechat_core::{Response, ResponseKind};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Pagechat".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Scrape a page, then ask about it\n".dimmed());
}

/// Print the interactive usage hint
pub fn print_hint() {
    eprintln!(
        "{} {} {} {} {}",
        "ℹ".blue(),
        "Send".bright_blue(),
        "scrape: <url>".bright_white(),
        "to load a page, then ask questions. Type".bright_blue(),
        "exit".bright_white()
    );
}

/// Print the input prompt
pub fn print_prompt() {
    eprint!("{} ", "you>".bold().bright_cyan());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print one bot reply, styled by kind
pub fn print_response(response: &Response) {
    match response.kind {
        ResponseKind::Scraped => println!("{} {}", "✓".green(), response.text.bright_green()),
        ResponseKind::Source => println!("{}", response.text),
        ResponseKind::Answer => {
            println!("{}", response.text);
            if let Some(meta) = &response.source_meta {
                println!("{}", format!("  from {} <{}>", meta.title, meta.url).dimmed());
            }
        }
        ResponseKind::Error => println!("{} {}", "✗".red(), response.text.bright_red()),
    }
}

/// Print one bot reply as a single JSON line
pub fn print_json(response: &Response) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

/// Print answer details for verbose mode
pub fn print_details(response: &Response) {
    if let Some(confidence) = response.confidence {
        let label = format!("{:.2}", confidence);
        let styled = if confidence >= 0.5 {
            label.bright_green().to_string()
        } else if confidence > 0.0 {
            label.bright_yellow().to_string()
        } else {
            label.bright_red().to_string()
        };
        eprintln!("  {} {}", "Confidence:".dimmed(), styled);
    }
    if let Some(meta) = &response.source_meta {
        eprintln!("  {} {}", "Fetched:".dimmed(), meta.fetched_at.bright_white());
    }
}
