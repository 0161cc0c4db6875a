use super::{cancel_on_ctrl_c, file_progress_bar, format_size, prompt_password, spinner};
use crate::config::Settings;
use anyhow::{Result, anyhow};
use clap::Args;
use dirsnap_core::{CancelFlag, ContainerRepository, ExtensionFilter, Scanner};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct CaptureCommand {
    #[arg(help = "Directory to capture")]
    source: PathBuf,

    #[arg(help = "Container file to write")]
    output: PathBuf,

    #[arg(long = "ext", help = "Extensions to include (overrides saved settings)")]
    extensions: Vec<String>,

    #[arg(long, help = "Encrypt the container, prompting for a password if none was given")]
    encrypt: bool,

    #[arg(long, help = "Follow symbolic links while scanning")]
    follow_links: bool,
}

impl CaptureCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let filter = if self.extensions.is_empty() {
            let settings_path = Settings::location(cli.config.as_deref())?;
            Settings::load(&settings_path)?.filter()
        } else {
            ExtensionFilter::from_list(&self.extensions)
        };

        if filter.is_empty() {
            return Err(anyhow!(
                "No extensions selected; add some with `dirsnap extensions add` or --ext"
            ));
        }

        let password = match cli.password.clone() {
            Some(password) if self.encrypt && password.is_empty() => {
                return Err(anyhow!("--encrypt needs a non-empty password"));
            }
            Some(password) => Some(password),
            None if self.encrypt => Some(self.confirm_password()?),
            None => None,
        };

        info!(
            "Capturing {} with extensions: {}",
            self.source.display(),
            filter.list().join(", ")
        );

        let cancel = CancelFlag::new();
        cancel_on_ctrl_c(cancel.clone());

        let pb = file_progress_bar("Capturing files");
        let source = self.source.clone();
        let follow_links = self.follow_links;
        let bar = pb.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            let mut on_progress = |current: u64, total: u64| {
                bar.set_length(total);
                bar.set_position(current);
            };
            Scanner::new(&filter)
                .follow_links(follow_links)
                .with_cancel(cancel)
                .scan(&source, Some(&mut on_progress))
        })
        .await?;
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                pb.abandon_with_message("Capture failed");
                return Err(e.into());
            }
        };
        pb.finish_with_message("Files captured");

        let stats = snapshot.stats();
        let encrypted = password.as_deref().is_some_and(|p| !p.is_empty());
        let saving = spinner(if encrypted {
            "Encrypting and saving..."
        } else {
            "Saving..."
        });
        let output = self.output.clone();
        tokio::task::spawn_blocking(move || {
            ContainerRepository::new().save(&snapshot, &output, password.as_deref())
        })
        .await??;
        saving.finish_and_clear();

        println!("✅ Capture completed!");
        println!("📁 Directories: {}", stats.directory_count);
        println!("📄 Files: {}", stats.file_count);
        println!("💾 Size: {}", format_size(stats.total_size));
        println!(
            "🔒 Container: {}{}",
            self.output.display(),
            if encrypted { " (encrypted)" } else { "" }
        );

        Ok(())
    }

    fn confirm_password(&self) -> Result<String> {
        let first = prompt_password("Enter container password: ")?;
        if first.is_empty() {
            return Err(anyhow!("Password must not be empty"));
        }
        let second = prompt_password("Confirm container password: ")?;
        if first != second {
            return Err(anyhow!("Passwords do not match"));
        }
        Ok(first)
    }
}
