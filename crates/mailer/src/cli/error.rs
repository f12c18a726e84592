#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
