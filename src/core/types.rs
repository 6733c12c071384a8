use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an analysis on the server side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(u64);

impl AnalysisId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AnalysisId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid analysis id '{}': {}", s, e))
    }
}

/// Stable identifier of a variable (a matrix row) in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(i64);

impl VariableId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation token handed out for every row request.
///
/// Tokens are strictly increasing; only the response carrying the latest
/// token may be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Advance to the next generation and return it
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One fetched correlation row, positionally aligned with the catalog columns
pub type CorrelationRow = Vec<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_id_parsing() {
        assert_eq!(AnalysisId::from_str("42").unwrap(), AnalysisId::new(42));
        assert_eq!(AnalysisId::from_str(" 7 ").unwrap().get(), 7);
        assert!(AnalysisId::from_str("abc").is_err());
    }

    #[test]
    fn test_request_tokens_increase() {
        let first = RequestToken::default();
        let second = first.next();
        let third = second.next();

        assert!(second > first);
        assert!(third > second);
        assert_eq!(third.get(), 2);
    }

    #[test]
    fn test_variable_id_serialization() {
        let id = VariableId::new(17);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "17");

        let restored: VariableId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }
}
