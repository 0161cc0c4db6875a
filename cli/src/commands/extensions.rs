use crate::config::Settings;
use anyhow::Result;
use clap::{Args, Subcommand};
use dirsnap_core::DEFAULT_EXTENSIONS;
use tracing::info;

#[derive(Args)]
pub struct ExtensionsCommand {
    #[command(subcommand)]
    action: ExtensionsAction,
}

#[derive(Subcommand)]
enum ExtensionsAction {
    #[command(about = "List allowed extensions")]
    List,

    #[command(about = "Allow one or more extensions")]
    Add {
        #[arg(required = true, help = "Extensions, with or without the leading dot")]
        extensions: Vec<String>,
    },

    #[command(about = "Stop allowing one or more extensions")]
    Remove {
        #[arg(required = true, help = "Extensions, with or without the leading dot")]
        extensions: Vec<String>,
    },

    #[command(about = "Remove every extension")]
    Clear,

    #[command(about = "Restore the default extensions")]
    Reset,
}

impl ExtensionsCommand {
    pub fn run(&self, cli: &crate::Cli) -> Result<()> {
        let path = Settings::location(cli.config.as_deref())?;
        let mut settings = Settings::load(&path)?;
        let mut filter = settings.filter();

        match &self.action {
            ExtensionsAction::List => {
                if filter.is_empty() {
                    println!("No extensions allowed");
                }
                for ext in filter.list() {
                    println!("{}", ext);
                }
                return Ok(());
            }
            ExtensionsAction::Add { extensions } => {
                for ext in extensions {
                    if !filter.add(ext) {
                        println!("Already allowed: {}", ext);
                    }
                }
            }
            ExtensionsAction::Remove { extensions } => {
                for ext in extensions {
                    if !filter.remove(ext) {
                        println!("Not in list: {}", ext);
                    }
                }
            }
            ExtensionsAction::Clear => filter.clear(),
            ExtensionsAction::Reset => filter.reset(DEFAULT_EXTENSIONS),
        }

        settings.set_filter(&filter);
        settings.save(&path)?;
        info!("Saved settings to {}", path.display());
        println!("Allowed extensions: {}", filter.list().join(" "));
        Ok(())
    }
}
