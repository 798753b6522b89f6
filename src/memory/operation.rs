use std::fmt;

use crate::error::MemgenError;
use crate::util;

pub const MAX_PARALLEL_ACCESSES: u64 = 16;

/// Address relationship between the concurrent accesses of one operation.
///
/// `Modulo` accesses are guaranteed distinct modulo a power of two, so a bank
/// can be selected statically from the low address bits. `Unknown` accesses
/// carry no such guarantee and cost physical replication or a second port.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AccessPattern {
    Modulo,
    Unknown,
}

/// One set of memory accesses performed in the same clock cycle.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Operation {
    pub read_count: u64,
    pub read_pattern: AccessPattern,
    pub write_count: u64,
    pub write_pattern: AccessPattern,
}

impl Operation {
    /// Parses an operation token of the form `<writes><w|wu>:<reads><r|ru>`
    /// (case-insensitive), validated against the memory's word count.
    pub fn parse(token: &str, words: u64) -> Result<Operation, MemgenError> {
        let invalid = |reason: String| MemgenError::InvalidOperation {
            token: token.to_string(),
            reason,
        };

        let (write_count, write_suffix, read_count, read_suffix) =
            sscanf::sscanf!(token, "{u64}{str:/[A-Za-z]+/}:{u64}{str:/[A-Za-z]+/}")
                .map_err(|_| invalid("expected <writes><w|wu>:<reads><r|ru>".to_string()))?;

        if read_count > words || write_count > words {
            return Err(invalid(format!(
                "more parallel accesses than the {words} addressable words"
            )));
        }

        if read_count > MAX_PARALLEL_ACCESSES {
            return Err(invalid(format!("at most {MAX_PARALLEL_ACCESSES} parallel reads are supported")));
        }

        let read_pattern = match read_suffix.to_ascii_lowercase().as_str() {
            "ru" => AccessPattern::Unknown,
            "r" => {
                if !util::is_power_of_two_or_zero(read_count) {
                    return Err(invalid(
                        "modulo address pattern requires a power-of-two read count".to_string(),
                    ));
                }

                AccessPattern::Modulo
            }
            _ => return Err(invalid(format!("unrecognized read pattern \"{read_suffix}\""))),
        };

        if write_count > MAX_PARALLEL_ACCESSES {
            return Err(invalid(format!("at most {MAX_PARALLEL_ACCESSES} parallel writes are supported")));
        }

        let write_pattern = match write_suffix.to_ascii_lowercase().as_str() {
            "wu" => {
                if write_count > 2 {
                    return Err(invalid(
                        "at most 2 parallel writes with unknown pattern are supported".to_string(),
                    ));
                }

                if write_count == 2 && read_count != 0 {
                    return Err(invalid(
                        "2 parallel writes with unknown pattern cannot be combined with reads".to_string(),
                    ));
                }

                AccessPattern::Unknown
            }
            "w" => {
                if !util::is_power_of_two_or_zero(write_count) {
                    return Err(invalid(
                        "modulo address pattern requires a power-of-two write count".to_string(),
                    ));
                }

                AccessPattern::Modulo
            }
            _ => return Err(invalid(format!("unrecognized write pattern \"{write_suffix}\""))),
        };

        Ok(Operation {
            read_count,
            read_pattern,
            write_count,
            write_pattern,
        })
    }

    pub fn mixes_reads_and_writes(&self) -> bool {
        self.read_count > 0 && self.write_count > 0
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_suffix = match self.write_pattern {
            AccessPattern::Modulo => "w",
            AccessPattern::Unknown => "wu",
        };
        let read_suffix = match self.read_pattern {
            AccessPattern::Modulo => "r",
            AccessPattern::Unknown => "ru",
        };
        write!(f, "{}{write_suffix}:{}{read_suffix}", self.write_count, self.read_count)
    }
}
