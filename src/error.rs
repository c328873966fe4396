/// Error types for the translation engine
///
/// Missing keys are deliberately not an error: resolution misses degrade
/// to returning the raw key. The variants here cover configuration
/// defects in caller-supplied data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A plural-form object is missing the mandatory `other` category
    PluralConfig { key: String },
    /// An interpolation template contains an unterminated `{{` tag
    TemplateSyntax { template: String, position: usize },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::PluralConfig { key } => {
                write!(f, "Plural forms for '{}' are missing the 'other' category", key)
            }
            EngineError::TemplateSyntax { template, position } => {
                write!(
                    f,
                    "Unterminated '{{{{' tag at byte {} in template '{}'",
                    position, template
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
