use std::fmt;

/// Route registration error
///
/// Every variant is a configuration mistake: it is reported while the route
/// table is being built and must stop the process from serving with an
/// incomplete table. Lookups never produce a `RouteError`; a path that does
/// not match anything is an ordinary `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The HTTP method string was empty
    EmptyMethod,
    /// The HTTP method string is not a valid method token
    InvalidMethod {
        /// The rejected method string
        method: String,
    },
    /// The pattern does not begin with `/`
    InvalidPattern {
        /// The rejected pattern
        pattern: String,
    },
    /// The route was registered without any handler
    MissingHandler {
        /// Pattern the empty chain was registered for
        pattern: String,
    },
    /// A literal terminal and a param/wildcard terminal would share a trie position
    ///
    /// Neither pattern could be given a deterministic precedence over the
    /// other, so the later registration is rejected.
    Conflict {
        /// The pattern being registered
        new: String,
        /// The already registered pattern it collides with
        existing: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::EmptyMethod => write!(f, "HTTP method can not be empty"),
            RouteError::InvalidMethod { method } => {
                write!(f, "'{method}' is not a valid HTTP method")
            }
            RouteError::InvalidPattern { pattern } => {
                write!(f, "path must begin with '/', got '{pattern}'")
            }
            RouteError::MissingHandler { pattern } => {
                write!(f, "handler can not be nil for path '{pattern}'")
            }
            RouteError::Conflict { new, existing } => write!(
                f,
                "the new path '{new}' conflicts with existing path '{existing}'"
            ),
        }
    }
}

impl std::error::Error for RouteError {}
