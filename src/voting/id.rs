use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Opaque identifier for polls and options. Persisted documents may carry ids
/// produced by other writers, so any string is accepted on read.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);
impl Id {
    pub fn new() -> Id {
        Id(Uuid::new_v4().simple().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Default for Id {
    fn default() -> Id {
        Id::new()
    }
}
impl Display for Id {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for Id {
    fn from(value: &str) -> Id {
        Id(String::from(value))
    }
}
impl From<String> for Id {
    fn from(value: String) -> Id {
        Id(value)
    }
}
impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
