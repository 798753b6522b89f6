use log::error;
use structopt::StructOpt;

use memgen::compiler;
use memgen::config::{Config, Opt};
use memgen::logging::logger::{self, Logger};

fn main() {
    let opt = Opt::from_args();
    logger::init(Logger).expect("Logger must only be initialized once.");

    let config = Config::new(&opt);
    if let Err(err) = compiler::run(&config) {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}
