use crate::ptree::PTreeError;

/// Convenience alias for the explorer [Result](std::result::Result) type.
pub type ExplorerResult<T> = std::result::Result<T, ExplorerError>;

/// Error variants for explorer construction.
///
/// Contract violations during scheduling (selecting from an empty explorer,
/// removing an untracked state, pausing twice) are programming errors and
/// abort instead of surfacing here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExplorerError {
    WalkerLimit,
}

impl ExplorerError {
    /// Gets the string representation of the error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalkerLimit => "explorer: No walker tags left in the process tree",
        }
    }
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for ExplorerError {}

impl From<PTreeError> for ExplorerError {
    fn from(err: PTreeError) -> Self {
        match err {
            PTreeError::WalkerLimit => Self::WalkerLimit,
        }
    }
}
