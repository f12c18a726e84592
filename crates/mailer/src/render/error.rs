#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("template name is empty")]
    EmptyName,
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
    #[error("template '{0}' not found")]
    UnknownTemplate(String),
    #[error("template '{template}' needs variable '{variable}'")]
    MissingVariable { template: String, variable: String },
}
