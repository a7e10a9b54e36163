/// Errors raised while building or evaluating a search tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Mismatched quotes")]
    MismatchedQuotes,

    #[error("Mismatched parenthesis")]
    MismatchedParenthesis,

    #[error("no type found for token \"{token}\"")]
    NoTypeFound { token: String },

    #[error("invalid arguments for function {name}")]
    InvalidArguments { name: String },

    #[error("NOT at end is not allowed")]
    NotAtEnd,

    #[error("operator {operator} is missing an operand")]
    MissingOperand { operator: String },

    #[error("query nesting exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("row does not contain expected field \"{name}\"")]
    MissingField { name: String },
}

impl SearchError {
    pub fn no_type_found(token: impl Into<String>) -> Self {
        Self::NoTypeFound { token: token.into() }
    }

    pub fn invalid_arguments(name: impl Into<String>) -> Self {
        Self::InvalidArguments { name: name.into() }
    }

    pub fn missing_operand(operator: impl Into<String>) -> Self {
        Self::MissingOperand {
            operator: operator.into(),
        }
    }

    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    /// Structural errors come from the scanners, before any node exists.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MismatchedQuotes | Self::MismatchedParenthesis)
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
