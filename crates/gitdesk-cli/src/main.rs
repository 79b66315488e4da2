//! gitdesk CLI - a small git front-end over the gitdesk facade.

use clap::Parser;
use gitdesk_core::Config;

mod commands;
mod logging;
mod output;

use commands::{Cli, Globals};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            std::process::exit(1);
        }
    };
    logging::init(cli.verbose, config.logging.level.as_deref());

    let globals = Globals {
        repo: cli.repo,
        config,
        yes: cli.yes,
    };

    if let Err(e) = commands::dispatch(cli.command, &globals) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
