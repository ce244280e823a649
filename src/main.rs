use std::process;

use clap::Parser;

use zxspec::{config, util};

fn main() {
    let config = config::Config::parse();

    if let Err(err) = util::setup_logger(config.log_level()) {
        eprintln!("Unable to set up logging: {err}");
    }

    zxspec::run(config).unwrap_or_else(|err| {
        eprintln!("Error running application: {err:#}");
        process::exit(1)
    });
}
