//! Store users, created from a kind name

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// Publishes games
    Developer,
    /// Buys games
    Customer,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Developer => "developer",
            UserKind::Customer => "customer",
        }
    }
}

impl FromStr for UserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "developer" => Ok(UserKind::Developer),
            "customer" => Ok(UserKind::Customer),
            _ => Err(Error::UnknownUserKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for UserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub kind: UserKind,
}

impl User {
    /// Build a user from its kind name (`developer` or `customer`)
    pub fn create(kind: &str) -> crate::Result<Self> {
        Ok(Self { kind: kind.parse()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_known_kinds() {
        assert_eq!(User::create("developer").unwrap().kind, UserKind::Developer);
        assert_eq!(User::create("customer").unwrap().kind, UserKind::Customer);
    }

    #[test]
    fn test_factory_rejects_unknown_kind() {
        let err = User::create("admin").unwrap_err();
        assert!(matches!(err, Error::UnknownUserKind(ref kind) if kind == "admin"));
    }
}
