use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of one evaluable value: `entity.property`.
///
/// The entity is a widget id or a data-source id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityPath {
    pub entity: String,
    pub property: String,
}

impl EntityPath {
    pub fn new(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.property)
    }
}

impl FromStr for EntityPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((entity, property)) if !entity.is_empty() && !property.is_empty() => {
                Ok(EntityPath::new(entity, property))
            }
            _ => Err(format!("'{}' is not an entity.property path", s)),
        }
    }
}

impl From<EntityPath> for String {
    fn from(path: EntityPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for EntityPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
