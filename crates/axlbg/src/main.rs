mod cli;
mod run;
mod window;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::PrintConfig) => run::print_config(&cli.run),
        None => run::run(cli.run),
    }
}
