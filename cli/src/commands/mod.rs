pub mod capture;
pub mod extensions;
pub mod inspect;
pub mod restore;

use anyhow::{Result, anyhow};
use dirsnap_core::{CancelFlag, ContainerKind, ContainerRepository};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

pub(crate) fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    rpassword::read_password().map_err(|e| anyhow!("Failed to read password: {}", e))
}

/// Kind of `container` and the password for opening it: the global
/// `--password` if given, otherwise a prompt, but only when the container is
/// actually encrypted.
pub(crate) fn password_for(
    repo: &ContainerRepository,
    container: &Path,
    cli: &crate::Cli,
) -> Result<(ContainerKind, Option<String>)> {
    let kind = repo.inspect(container)?;
    let password = match kind {
        ContainerKind::Plaintext => None,
        ContainerKind::Encrypted => match cli.password.clone() {
            Some(password) => Some(password),
            None => Some(prompt_password("Enter container password: ")?),
        },
    };
    Ok((kind, password))
}

pub(crate) fn file_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(message.to_string());
    pb
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Cancels `flag` on Ctrl-C so long scans and restores stop between files.
pub(crate) fn cancel_on_ctrl_c(flag: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current file");
            flag.cancel();
        }
    });
}

pub(crate) fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
