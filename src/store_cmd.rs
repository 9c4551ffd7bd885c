//! `hnd list`, `hnd show`, and `hnd stats` commands.
//!
//! Read-only views over the configured digest store.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::render::{format_digest_markdown, format_digest_telegram, DigestView};
use crate::store::create_store;

/// Run the list command: print stored digest dates, most recent first.
pub async fn run_list(config: &Config, limit: usize) -> Result<()> {
    let store = create_store(&config.storage)?;
    let dates = store.list_dates(limit).await?;
    if dates.is_empty() {
        println!("No digests stored.");
        return Ok(());
    }
    for date in dates {
        println!("{}", date);
    }
    Ok(())
}

/// Run the show command: print the stored digest for a date.
pub async fn run_show(config: &Config, date: &str, format: &str) -> Result<()> {
    let store = create_store(&config.storage)?;
    let digest = match store.load(date).await? {
        Some(digest) => digest,
        None => {
            eprintln!("Error: no digest stored for {}", date);
            std::process::exit(1);
        }
    };

    match format {
        "md" | "markdown" => println!("{}", format_digest_markdown(&digest)),
        "telegram" => println!("{}", format_digest_telegram(&digest)),
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&DigestView::from(&digest))?
        ),
        other => bail!("Unknown format: '{}'. Must be md, telegram, or json.", other),
    }
    Ok(())
}

/// Run the stats command: print a summary of the store.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = create_store(&config.storage)?;
    let stats = store.stats().await?;

    println!("HN Digest — Store Stats");
    println!("=======================");
    println!();
    println!("  Location:  {}", stats.location);
    println!("  Digests:   {}", stats.digest_count);
    println!("  Size:      {}", format_bytes(stats.total_size_bytes));
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
