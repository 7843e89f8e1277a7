use crate::config::ViewerConfig;
use crate::model::{Content, MediaKind};
use crate::navigation::Navigator;
use crate::rail::{Rail, RingStyle};
use crate::service::{demo_groups, InMemoryStoryService, StoryService};
use colored::*;
use std::path::Path;

/// Shared implementation of the `story` binary.
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let bin = args
        .first()
        .map(|s| s.as_str())
        .unwrap_or("story")
        .to_string();

    if args.len() < 2 {
        print_usage(&bin);
        return Ok(());
    }

    let command = &args[1];
    let rest: Vec<String> = std::iter::once(bin.clone())
        .chain(args[2..].iter().cloned())
        .collect();

    match command.as_str() {
        "rail" => {
            let config = ViewerConfig::from_args(&rest)?;
            show_rail(&config).await?;
        }
        "walk" => {
            let config = ViewerConfig::from_args(&rest)?;
            walk(&config).await?;
        }
        "export-demo" => {
            let Some(path) = args.get(2) else {
                eprintln!("{}", format!("Usage: {} export-demo <path>", bin).yellow());
                return Ok(());
            };
            export_demo(Path::new(path)).await?;
        }
        _ => {
            eprintln!("{} Unknown command: {}", "✗".red().bold(), command.red());
            print_usage(&bin);
        }
    }

    Ok(())
}

fn print_usage(bin: &str) {
    println!("{}", "⚡ Storyview CLI".bright_cyan().bold());
    println!();
    println!("{}", "Usage:".bright_white().bold());
    println!("  {} <command> [args]", bin.cyan());
    println!();
    println!("{}", "Commands:".bright_white().bold());
    println!(
        "  {} [--fixture <path>]        Print the story rail",
        "rail".cyan()
    );
    println!(
        "  {} [--fixture <path>] [--start N]  Step through every item with next",
        "walk".cyan()
    );
    println!(
        "  {} <path>             Write the demo dataset as a JSON fixture",
        "export-demo".cyan()
    );
}

pub fn open_service(config: &ViewerConfig) -> anyhow::Result<InMemoryStoryService> {
    match &config.fixture {
        Some(path) => Ok(InMemoryStoryService::from_json_file(path)?),
        None => Ok(InMemoryStoryService::new(demo_groups(42, chrono::Utc::now()))),
    }
}

async fn show_rail(config: &ViewerConfig) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let groups = service.fetch_groups().await?;
    let rail = Rail::new(groups).with_window(config.decay_window);
    let entries = rail.entries(chrono::Utc::now());

    if entries.is_empty() {
        println!("{}", "No stories".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Stories ({})", entries.len()).bright_cyan().bold()
    );
    println!("{}", "─".repeat(60).dimmed());
    for entry in entries {
        let ring = match entry.ring {
            RingStyle::UnseenGradient => "◉".magenta().bold(),
            RingStyle::Muted => "○".dimmed(),
        };
        let level = (entry.brightness * 255.0).round() as u8;
        let name = entry.display_name.truecolor(level, level, level);
        println!(
            "  {} {} {} {}",
            ring,
            name,
            format!("[{} items]", entry.item_count).dimmed(),
            format!("brightness {:.2}", entry.brightness).dimmed()
        );
    }
    Ok(())
}

async fn walk(config: &ViewerConfig) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let groups = service.fetch_groups().await?;
    let mut nav = Navigator::open(
        groups.iter().map(|g| g.items.len()).collect(),
        config.start_group,
    );

    while let Some(cursor) = nav.cursor() {
        let group = &groups[cursor.group];
        let item = &group.items[cursor.item];
        let content = match item.content() {
            Content::Media(media) => match media.kind {
                MediaKind::Image => format!("image {}", media.url),
                MediaKind::Video => format!("video {}", media.url),
            },
            Content::Text(body) => format!("\"{}\"", body),
            Content::Placeholder => "(empty)".to_string(),
        };
        println!(
            "{} {} {}",
            format!("({},{})", cursor.group, cursor.item).cyan(),
            group.author.display_name.bright_white(),
            content.dimmed()
        );
        nav.next();
    }
    println!("{}", "✓ closed".green().bold());
    Ok(())
}

async fn export_demo(path: &Path) -> anyhow::Result<()> {
    let service = InMemoryStoryService::new(demo_groups(42, chrono::Utc::now()));
    service.save_json_file(path).await?;
    println!(
        "{} Demo fixture written to {}",
        "✓".green().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}
