use std::fs;
use std::path::Path;

use itertools::Itertools;

use crate::error::MemgenError;
use crate::memory::operation::Operation;

/// One logical memory to synthesize: a name, a geometry, and the set of
/// concurrent access patterns its users will drive in a single cycle.
#[derive(Clone, Debug)]
pub struct MemoryRequest {
    name: String,
    words: u64,
    width: u64,
    ops: Vec<Operation>,
}

impl MemoryRequest {
    pub fn new(name: &str, words: u64, width: u64, ops: Vec<Operation>) -> Result<MemoryRequest, MemgenError> {
        let malformed = |reason: &str| MemgenError::RequestFormat {
            line: name.to_string(),
            reason: reason.to_string(),
        };

        if words == 0 {
            return Err(malformed("illegal number of words"));
        }

        if width == 0 {
            return Err(malformed("illegal bit-width"));
        }

        if ops.is_empty() {
            return Err(malformed("no operation specified"));
        }

        Ok(MemoryRequest {
            name: name.to_string(),
            words,
            width,
            ops,
        })
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

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn op_list(&self) -> String {
        self.ops.iter().join(" ")
    }
}

/// Reads a request file: one memory per line,
/// `<name> <words> <width> <op> [<op> ...]`.
/// Blank lines and lines starting with `#` are ignored.
pub fn read_requests(path: &Path) -> Result<Vec<MemoryRequest>, MemgenError> {
    let text = fs::read_to_string(path).map_err(|source| MemgenError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut requests = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        requests.push(parse_request(line)?);
    }

    Ok(requests)
}

fn parse_request(line: &str) -> Result<MemoryRequest, MemgenError> {
    let malformed = |reason: &str| MemgenError::RequestFormat {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, words, width, op_tokens @ ..] = &fields[..] else {
        return Err(malformed("expected <name> <words> <width> <op> [<op> ...]"));
    };

    let words: u64 = words.parse().map_err(|_| malformed("bad word count"))?;
    let width: u64 = width.parse().map_err(|_| malformed("bad bit-width"))?;
    let ops = op_tokens.iter()
        .map(|token| Operation::parse(token, words))
        .collect::<Result<Vec<Operation>, MemgenError>>()?;

    MemoryRequest::new(name, words, width, ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_request_parses() {
        let request = parse_request("accbuf 2048 32 1w:1r 0w:4r").unwrap();
        assert_eq!(request.name(), "accbuf");
        assert_eq!(request.words(), 2048);
        assert_eq!(request.width(), 32);
        assert_eq!(request.ops().len(), 2);
        assert_eq!(request.op_list(), "1w:1r 0w:4r");
    }

    #[test]
    fn zero_words_rejected() {
        assert!(parse_request("m 0 32 1w:1r").is_err());
    }

    #[test]
    fn zero_width_rejected() {
        assert!(parse_request("m 1024 0 1w:1r").is_err());
    }

    #[test]
    fn missing_ops_rejected() {
        assert!(parse_request("m 1024 32").is_err());
    }

    #[test]
    fn bad_op_token_rejected() {
        assert!(parse_request("m 1024 32 1q:1r").is_err());
    }

    #[test]
    fn short_line_rejected() {
        assert!(parse_request("m 1024").is_err());
    }
}
