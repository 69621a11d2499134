//! Ordered tool name requests.

use std::fmt;

use crate::builder::errors::ExtError;

/// An ordered, non-empty list of acceptable names for one tool.
///
/// The first name is the primary name; the rest are aliases tried in order
/// (e.g. `["gcc", "cc"]`). A single tool is just a one-element request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolRequest {
    names: Vec<String>,
}

impl ToolRequest {
    /// Create a request from an ordered list of names.
    pub fn new<I, S>(names: I) -> Result<Self, ExtError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ExtError::EmptyToolRequest);
        }
        Ok(ToolRequest { names })
    }

    /// Create a request for a single tool name.
    pub fn single(name: impl Into<String>) -> Self {
        ToolRequest {
            names: vec![name.into()],
        }
    }

    /// The primary (first) name.
    pub fn primary(&self) -> &str {
        &self.names[0]
    }

    /// All names, primary first.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Display for ToolRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_rejected() {
        let err = ToolRequest::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ExtError::EmptyToolRequest));
    }

    #[test]
    fn test_primary_is_first() {
        let req = ToolRequest::new(["g++", "c++"]).unwrap();
        assert_eq!(req.primary(), "g++");
        assert_eq!(req.names().len(), 2);
        assert_eq!(req.to_string(), "g++|c++");
    }

    #[test]
    fn test_single() {
        let req = ToolRequest::single("ar");
        assert_eq!(req.names(), ["ar".to_string()]);
    }
}
