use thiserror::Error;

/// Failures while substituting `{name}` placeholders into a command template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{name}}}' in template")]
    UnknownPlaceholder { name: String },

    #[error("unclosed '{{' at byte {offset}")]
    Unclosed { offset: usize },

    #[error("unmatched '}}' at byte {offset}")]
    UnmatchedBrace { offset: usize },
}
