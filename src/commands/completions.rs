//! Shell completion generation.

use clap::Command;
use clap_complete::Shell;
use std::io;

/// Writes the completion script for `shell` to stdout.
pub fn cmd_completions(shell: Shell, mut command: Command) {
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
}
