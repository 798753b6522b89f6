use log::info;

use crate::error::MemgenError;
use crate::library::{SramMacro, TechLibrary};
use crate::memory::operation::{AccessPattern, Operation};
use crate::memory::request::MemoryRequest;

/// How one operation inflates the bank structure: copies of the whole array
/// (duplication) and address-interleaved banks (distribution). Contributions
/// from all operations are combined by `max`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
struct Contribution {
    duplication: u64,
    distribution: u64,
}

/// The replication factors and SRAM macro selected for one memory request.
///
/// The wrapper instantiates `duplication_factor * distribution_factor
/// * vbanks * hhbanks` copies of `bank_type`:
/// duplicated sets serve unknown-pattern parallelism, distributed banks serve
/// modulo-pattern parallelism, vertical banks reach the word count, and
/// width banks reach the bit-width.
#[derive(Clone, Debug)]
pub struct BankingPlan {
    pub read_interfaces: u64,
    pub write_interfaces: u64,
    pub need_dual_port: bool,
    pub need_parallel_rw: bool,
    pub duplication_factor: u64,
    pub distribution_factor: u64,
    pub vbanks: u64,
    pub hhbanks: u64,
    pub bank_type: SramMacro,
    pub area: f64,
}

impl BankingPlan {
    pub fn report(&self) {
        info!("      read_interfaces {}", self.read_interfaces);
        info!("      write_interfaces {}", self.write_interfaces);
        info!("      duplication_factor {}", self.duplication_factor);
        info!("      distribution_factor {}", self.distribution_factor);
        info!("      need_dual_port {}", self.need_dual_port);
        info!("      need_parallel_rw {}", self.need_parallel_rw);
        info!("      d-banks {}", self.duplication_factor);
        info!("      h-banks {}", self.distribution_factor);
        info!("      v-banks {}", self.vbanks);
        info!("      hh-banks {}", self.hhbanks);
        info!("      bank type {}", self.bank_type.name());
        info!("      Total area {}", self.area);
    }
}

/// Derives the banking plan for one request against the technology library.
pub fn plan(request: &MemoryRequest, library: &TechLibrary) -> Result<BankingPlan, MemgenError> {
    let ops = request.ops();

    // Pass 1: interface counts and port capability. The wrapper always
    // exposes at least one interface of each kind.
    let read_interfaces = ops.iter().map(|op| op.read_count).max().unwrap_or(0).max(1);
    let write_interfaces = ops.iter().map(|op| op.write_count).max().unwrap_or(0).max(1);
    let need_parallel_rw = ops.iter().any(Operation::mixes_reads_and_writes);

    // Dual-port banks are mandatory when a cycle mixes reads with writes or
    // carries two unknown-pattern writes; they are also selected for any
    // other parallelism, where the second port halves the bank count.
    let need_dual_port = need_parallel_rw
        || ops.iter().any(|op| op.write_count == 2 && op.write_pattern == AccessPattern::Unknown)
        || (!need_parallel_rw && ops.iter().any(|op| op.read_count > 1 || op.write_count > 1));

    // Pass 2: per-op replication contributions, combined by max.
    let mut duplication_factor = 1;
    let mut distribution_factor = 1;
    for op in ops {
        let contribution = contribution(op, need_parallel_rw);
        duplication_factor = duplication_factor.max(contribution.duplication);
        distribution_factor = distribution_factor.max(contribution.distribution);
    }

    // Pass 3: choose the macro minimizing total area. First-seen wins ties.
    let words_per_hbank = request.words().div_ceil(distribution_factor);
    let mut best: Option<(SramMacro, u64, u64, f64)> = None;
    for sram in library.macros() {
        if need_dual_port && sram.ports() < 2 {
            continue;
        }

        let hhbanks = request.width().div_ceil(sram.width());
        let vbanks = words_per_hbank.div_ceil(sram.words());
        let bank_count = duplication_factor * distribution_factor * vbanks * hhbanks;
        let area = bank_count as f64 * sram.area();
        if best.as_ref().is_none_or(|(_, _, _, best_area)| *best_area > area) {
            best = Some((sram.clone(), vbanks, hhbanks, area));
        }
    }

    let Some((bank_type, vbanks, hhbanks, area)) = best else {
        return Err(MemgenError::NoSuitableMacro {
            name: request.name().to_string(),
        });
    };

    Ok(BankingPlan {
        read_interfaces,
        write_interfaces,
        need_dual_port,
        need_parallel_rw,
        duplication_factor,
        distribution_factor,
        vbanks,
        hhbanks,
        bank_type,
        area,
    })
}

fn contribution(op: &Operation, need_parallel_rw: bool) -> Contribution {
    let mut duplication = 1;
    if op.read_pattern == AccessPattern::Unknown && op.read_count > 1 {
        duplication = if op.write_count == 0 {
            // A dual-port bank serves two unknown-pattern reads per copy.
            op.read_count.div_ceil(2)
        } else {
            op.read_count
        };
    }

    if op.write_pattern == AccessPattern::Unknown && op.write_count > 1 {
        duplication = if op.read_count == 0 {
            op.write_count.div_ceil(2)
        } else {
            duplication.max(op.write_count)
        };
    }

    let mut distribution = 1;
    if op.read_pattern == AccessPattern::Modulo && op.read_count > 1 {
        distribution = if op.write_count != 0 || need_parallel_rw {
            op.read_count
        } else {
            // Port dedication is not forced, so each bank absorbs two reads.
            op.read_count >> 1
        };
    }

    if op.write_pattern == AccessPattern::Modulo && op.write_count > 1 {
        distribution = if op.read_count != 0 || need_parallel_rw {
            distribution.max(op.write_count)
        } else {
            op.write_count >> 1
        };
    }

    Contribution { duplication, distribution }
}
