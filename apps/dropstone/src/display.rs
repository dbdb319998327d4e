//! Output rendering and formatting

use crate::output::CommandOutput;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use dropstone_types::{
    ColorChoice, ContentHash, DownloadTarget, ListedVersion, RegistryStats, RemovalReport,
    VersionSummary,
};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            CommandOutput::Registered(summary) => {
                println!(
                    "{} {}/{} {}",
                    self.style_ok("Registered"),
                    summary.platform,
                    summary.quality,
                    self.style_version(&summary.version)
                );
                println!("  URL:    {}", summary.url);
                println!("  SHA256: {}", summary.content_hash);
                Ok(())
            }
            CommandOutput::Removed(report) => self.render_removal(report),
            CommandOutput::Version(summary) => self.render_summary(summary),
            CommandOutput::Download(target) => self.render_download(target),
            CommandOutput::Listing(entries) => self.render_listing(entries),
            CommandOutput::Stats(stats) => self.render_stats(stats),
        }
    }

    fn render_summary(&self, summary: &VersionSummary) -> io::Result<()> {
        println!("{}", self.style_version(&summary.name));
        println!();
        println!("Platform:  {}", summary.platform);
        println!("Quality:   {}", summary.quality);
        println!("Version:   {}", summary.version);
        println!("Published: {}", format_timestamp(summary.timestamp));
        println!("URL:       {}", summary.url);
        println!("SHA256:    {}", format_hash(&summary.content_hash));
        Ok(())
    }

    fn render_removal(&self, report: &RemovalReport) -> io::Result<()> {
        let target = format!("{}/{}/{}", report.platform, report.quality, report.version);
        if !report.removed {
            println!("Nothing registered under {target}.");
            return Ok(());
        }

        println!("{} {target}", self.style_ok("Removed"));
        if report.artifact_deleted {
            println!("  Stored artifact deleted.");
        }
        match &report.latest {
            Some(latest) => println!("  Latest is now {}", latest.version),
            None => println!("  No versions left in {}/{}", report.platform, report.quality),
        }
        Ok(())
    }

    fn render_download(&self, target: &DownloadTarget) -> io::Result<()> {
        match target {
            DownloadTarget::Redirect { url } => {
                println!("Redirect: {url}");
            }
            DownloadTarget::LocalFile {
                path,
                display_name,
                size,
                content_hash,
            } => {
                println!("File:     {}", path.display());
                println!("Name:     {display_name}");
                println!("Size:     {}", format_size(*size));
                println!("SHA256:   {}", format_hash(content_hash));
            }
        }
        Ok(())
    }

    fn render_listing(&self, entries: &[ListedVersion]) -> io::Result<()> {
        if entries.is_empty() {
            println!("No versions registered.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Platform").add_attribute(Attribute::Bold),
            Cell::new("Quality").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Published").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
        ]);

        for entry in entries {
            let platform = if entry.platform.is_empty() {
                entry.key.as_str()
            } else {
                entry.platform.as_str()
            };
            table.add_row(vec![
                Cell::new(platform),
                Cell::new(&entry.quality),
                Cell::new(&entry.record.version),
                Cell::new(&entry.record.name),
                Cell::new(format_timestamp(entry.record.timestamp)),
                self.format_source(&entry.record.content_hash),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_stats(&self, stats: &RegistryStats) -> io::Result<()> {
        println!("Registry Statistics");
        println!();
        println!("Versions:        {}", stats.versions);
        println!("Latest pointers: {}", stats.latest);
        println!("Downloads:       {}", stats.downloads);
        println!(
            "Checked:         {}",
            stats.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(())
    }

    /// Local builds are identified by their hash; external ones by the sentinel
    fn format_source(&self, hash: &ContentHash) -> Cell {
        if hash.is_known() {
            Cell::new("Stored").fg(Color::Green)
        } else {
            Cell::new("External").fg(Color::Blue)
        }
    }

    fn style_ok(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().green().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn style_version(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn format_hash(hash: &ContentHash) -> String {
    match hash.as_hex() {
        Some(hex) => hex.to_string(),
        None => "- (hosted externally)".to_string(),
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
