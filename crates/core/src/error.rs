/// Failure modes of the highlighting pipeline.
///
/// None of these escape the public pipeline entry points: callers see an
/// absent highlight, never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HighlightError {
    #[error("phrase not found in page text")]
    NotFound,
    #[error("no run with usable geometry for range {start}..{end}")]
    MissingGeometry { start: usize, end: usize },
    #[error("semantic service error: {0}")]
    Service(String),
    #[error("highlighted fraction {fraction:.4} exceeds ceiling {ceiling:.2}")]
    OverDensity { fraction: f64, ceiling: f64 },
}

pub type HighlightResult<T> = Result<T, HighlightError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
}
