use super::{format_size, password_for};
use anyhow::{Result, anyhow};
use clap::Args;
use dirsnap_core::{ContainerKind, ContainerRepository, SnapshotStats};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct InspectCommand {
    #[arg(help = "Container file to read")]
    container: PathBuf,

    #[arg(long, help = "Output format (table, json)")]
    format: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    root_path: &'a str,
    created_at: String,
    encrypted: bool,
    stats: SnapshotStats,
    directories: Vec<&'a str>,
    files: Vec<FileReport<'a>>,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a str,
    size: u64,
    checksum: String,
}

impl InspectCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let format = self.format.as_deref().unwrap_or("table");
        if format != "table" && format != "json" {
            return Err(anyhow!("Unsupported format: {}", format));
        }

        let repo = ContainerRepository::new();
        let (kind, password) = password_for(&repo, &self.container, cli)?;
        let encrypted = kind == ContainerKind::Encrypted;
        let container = self.container.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            repo.load(&container, password.as_deref())
        })
        .await??;

        let report = Report {
            root_path: snapshot.root_path(),
            created_at: snapshot.created_at().to_rfc3339(),
            encrypted,
            stats: snapshot.stats(),
            directories: snapshot.directories().iter().map(|d| d.path()).collect(),
            files: snapshot
                .files()
                .iter()
                .map(|f| FileReport {
                    path: f.path(),
                    size: f.size(),
                    checksum: f.checksum().to_hex(),
                })
                .collect(),
        };

        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Root:        {}", report.root_path);
        println!("Created:     {}", report.created_at);
        println!("Encrypted:   {}", if encrypted { "yes" } else { "no" });
        println!("Directories: {}", report.stats.directory_count);
        println!("Files:       {}", report.stats.file_count);
        println!("Size:        {}", format_size(report.stats.total_size));
        for (ext, count) in &report.stats.extensions {
            println!("  {:<16} {}", ext, count);
        }
        println!();

        println!("{:<10} {:>10}  {}", "Checksum", "Size", "Path");
        println!("{:-<60}", "");
        for dir in &report.directories {
            println!("{:<10} {:>10}  {}/", "", "-", dir);
        }
        for file in &report.files {
            println!("{:<10} {:>10}  {}", &file.checksum[..8], file.size, file.path);
        }

        Ok(())
    }
}
