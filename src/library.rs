use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::MemgenError;

/// One physical SRAM type available in the target technology.
/// Immutable once loaded.
#[derive(PartialEq, Clone, Debug)]
pub struct SramMacro {
    name: String,
    words: u64,
    width: u64,
    area: f64,
    ports: u64,
}

impl SramMacro {
    pub fn new(name: &str, words: u64, width: u64, area: f64, ports: u64) -> SramMacro {
        SramMacro {
            name: name.to_string(),
            words,
            width,
            area,
            ports,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> u64 {
        self.words
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn ports(&self) -> u64 {
        self.ports
    }

    // One lib.txt line: <words> <width> <name> <area> <ports>.
    // A macro with a port count other than 1 or 2 is skipped with a warning.
    fn parse(line: &str) -> Result<Option<SramMacro>, MemgenError> {
        let malformed = |reason: &str| MemgenError::LibraryFormat {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [words, width, name, area, ports] = &fields[..] else {
            return Err(malformed("expected <words> <width> <name> <area> <ports>"));
        };

        let words: u64 = words.parse().map_err(|_| malformed("bad word count"))?;
        let width: u64 = width.parse().map_err(|_| malformed("bad bit-width"))?;
        let area: f64 = area.parse().map_err(|_| malformed("bad area"))?;
        let ports: u64 = ports.parse().map_err(|_| malformed("bad port count"))?;
        if !(1..=2).contains(&ports) {
            warn!("Skipping SRAM type {name} with unsupported number of ports");
            return Ok(None);
        }

        Ok(Some(SramMacro::new(name, words, width, area, ports)))
    }
}

/// All SRAM macros of a target technology, in lib.txt order.
/// Loaded once, then consulted read-only by the planner.
pub struct TechLibrary {
    macros: Vec<SramMacro>,
}

impl TechLibrary {
    pub fn load(tech: &Path) -> Result<TechLibrary, MemgenError> {
        let path = tech.join("lib.txt");
        let text = fs::read_to_string(&path).map_err(|source| MemgenError::Io { path, source })?;

        let mut macros = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(sram) = SramMacro::parse(line)? {
                info!(
                    "Found SRAM definition {:>20}{:>7}{:>3}-bit words {:>2} read/write ports",
                    sram.name(), sram.words(), sram.width(), sram.ports(),
                );
                macros.push(sram);
            }
        }

        Ok(TechLibrary { macros })
    }

    pub fn from_macros(macros: Vec<SramMacro>) -> TechLibrary {
        TechLibrary { macros }
    }

    pub fn macros(&self) -> &[SramMacro] {
        &self.macros
    }
}
