//! `kittypress completions <SHELL>`
//!
//! Usage: `kittypress completions bash > ~/.local/share/bash-completion/completions/kittypress`

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

const BIN_NAME: &str = "kittypress";

/// Print a shell completion script
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub async fn execute(&self) -> Result<()> {
        let mut stdout = io::stdout().lock();
        write_completions(self.shell, &mut stdout)?;
        stdout.flush().context("Failed to flush completion script")
    }
}

/// Writes the completion script for `shell` covering every kittypress subcommand
pub fn write_completions(shell: Shell, writer: &mut dyn Write) -> Result<()> {
    let mut cmd = crate::Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, writer);
    Ok(())
}
