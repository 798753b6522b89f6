use std::fs;
use std::path::PathBuf;

use log::info;

use crate::config::Config;
use crate::error::MemgenError;
use crate::hdl::{self, wrapper};
use crate::library::TechLibrary;
use crate::memory::planner;
use crate::memory::request;

/// Runs one batch: load the technology library, read the memory list, then
/// plan and emit every requested memory in order. Each output file is fully
/// written before the next request is handled; a failure leaves the files
/// already emitted in place.
pub fn run(config: &Config) -> Result<(), MemgenError> {
    info!("Target technology: {}", config.tech.display());
    let library = TechLibrary::load(&config.tech)?;

    info!("Memory list file: {}", config.infile.display());
    let requests = request::read_requests(&config.infile)?;

    for request in &requests {
        info!("Generating {}...", request.name());
        info!("      {} words, {} bits, {}", request.words(), request.width(), request.op_list());

        let plan = planner::plan(request, &library)?;
        plan.report();

        let module = wrapper::build(request, &plan, config.assertions);
        let path = PathBuf::from(format!("{}.v", request.name()));
        fs::write(&path, hdl::render_source(&module))
            .map_err(|source| MemgenError::Io { path, source })?;
    }

    Ok(())
}
