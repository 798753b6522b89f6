use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MemgenError {
    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed SRAM definition \"{line}\": {reason}")]
    LibraryFormat { line: String, reason: String },
    #[error("Malformed memory request \"{line}\": {reason}")]
    RequestFormat { line: String, reason: String },
    #[error("Invalid operation \"{token}\": {reason}")]
    InvalidOperation { token: String, reason: String },
    #[error("No suitable SRAM macro for memory \"{name}\"")]
    NoSuitableMacro { name: String },
}

impl MemgenError {
    // Usage errors exit with status 1 before this is ever consulted;
    // every run-time failure shares status 2.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
