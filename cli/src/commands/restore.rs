use super::{cancel_on_ctrl_c, file_progress_bar, format_size, password_for, spinner};
use anyhow::Result;
use clap::Args;
use dirsnap_core::{CancelFlag, ContainerRepository, Recreator};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct RestoreCommand {
    #[arg(help = "Container file to read")]
    container: PathBuf,

    #[arg(help = "Directory to recreate the tree in")]
    target: PathBuf,

    #[arg(long, help = "Fail if the target directory already has entries")]
    require_empty: bool,
}

impl RestoreCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = ContainerRepository::new();
        let (_, password) = password_for(&repo, &self.container, cli)?;

        info!("Loading container: {}", self.container.display());
        let loading = spinner("Loading container...");
        let container = self.container.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            repo.load(&container, password.as_deref())
        })
        .await??;
        loading.finish_and_clear();

        println!("📸 Restoring snapshot of {}", snapshot.root_path());
        println!("📅 Created: {}", snapshot.created_at().format("%Y-%m-%d %H:%M:%S UTC"));
        println!("📂 Target: {}", self.target.display());

        let cancel = CancelFlag::new();
        cancel_on_ctrl_c(cancel.clone());

        let pb = file_progress_bar("Restoring files");
        let bar = pb.clone();
        let target = self.target.clone();
        let recreator = Recreator::new()
            .require_empty_output(self.require_empty)
            .with_cancel(cancel);
        let result = tokio::task::spawn_blocking(move || {
            let mut on_progress = |current: u64, total: u64| {
                bar.set_length(total);
                bar.set_position(current);
            };
            recreator.recreate(&snapshot, &target, Some(&mut on_progress))
        })
        .await?;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                pb.abandon_with_message("Restore failed; files written so far were kept");
                return Err(e.into());
            }
        };
        pb.finish_with_message("Restore completed");

        println!("✅ Restore completed!");
        println!("📁 Directories: {}", summary.directories);
        println!("📄 Files: {}", summary.files);
        println!("💾 Size: {}", format_size(summary.bytes));

        Ok(())
    }
}
