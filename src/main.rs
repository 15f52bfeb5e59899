mod app;
mod build;
mod ccache;
mod cli;
mod compile_commands;
mod config;
mod consts;
mod error;
mod logging;
mod process;
mod teatime;
mod utils;

use clap::Parser;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match app::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("rockbuild: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
