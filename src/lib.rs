pub mod cli;
pub mod commands;
pub mod events;
pub mod location;
pub mod logging;
pub mod models;
pub mod persist;
pub mod reorder;
pub mod render;
pub mod state;
pub mod storage;

#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    use clap::Parser;

    use crate::cli::{execute, Cli, CliCtx};
    use crate::commands::CommandCtx;

    let cli = Cli::parse();
    let ctx = CliCtx::new(cli.data.clone());

    let logger = match ctx.data_dir() {
        Ok(dir) => match logging::init_logging(&dir) {
            Ok(handle) => Some(handle),
            Err(error) => {
                eprintln!("warning: logging disabled: {error}");
                None
            }
        },
        Err(_) => None,
    };

    let json = cli.json;
    let outcome = execute(cli, &ctx);
    if outcome.ok || json {
        print!("{}", outcome.output);
    } else {
        eprint!("{}", outcome.output);
    }
    // Flush buffered log lines before a non-zero exit skips destructors.
    drop(logger);
    if !outcome.ok {
        std::process::exit(1);
    }
}
