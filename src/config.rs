use std::path::PathBuf;

use structopt::StructOpt;

pub struct Config {
    pub tech: PathBuf,
    pub infile: PathBuf,
    pub assertions: bool,
}

impl Config {
    pub fn new(opt: &Opt) -> Config {
        Config {
            tech: opt.tech.clone(),
            infile: opt.infile.clone(),
            assertions: !opt.no_assert,
        }
    }
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(
    name = "memgen",
    about = "Generates multi-banked memory wrappers from a library of SRAM macros.",
    long_about = "\
Generates multi-banked memory wrappers from a library of SRAM macros.

Each line of the memory list file requests one logical memory:

    <name> <words> <width> <op> [<op> ...]

where every <op> describes one set of accesses performed in the same
clock cycle, written <writes>:<reads>:

    0w      no write operation
    1w      1 write operation
    <N>w    N parallel writes with known (modulo) address pattern;
            N must be a power of two for low-overhead bank selection
    2wu     2 parallel writes with unknown address pattern; viable on
            dual-port banks, only in combination with 0r
    0r      no read operation
    1r      1 read operation
    <N>r    N parallel reads with known (modulo) address pattern;
            N must be a power of two
    <N>ru   N parallel reads with unknown address pattern; served by
            duplicating the banked structure"
)]
pub struct Opt {
    /// Target technology directory containing lib.txt
    #[structopt(name = "tech", parse(from_os_str))]
    pub tech: PathBuf,

    /// List of required memories to generate, one descriptor per line
    #[structopt(name = "infile", parse(from_os_str))]
    pub infile: PathBuf,

    /// Skip emission of the simulation-only conflict checks
    #[structopt(name = "noassert", long)]
    pub no_assert: bool,
}
