use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use super::id::Id;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub poll_id: Id,
    pub option_id: Id,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    pub fn new(poll_id: &Id, option_id: &Id, user_id: &str) -> Vote {
        Vote {
            poll_id: poll_id.clone(),
            option_id: option_id.clone(),
            user_id: String::from(user_id),
            timestamp: Utc::now(),
        }
    }

    pub fn is_by(&self, poll_id: &str, user_id: &str) -> bool {
        self.poll_id == poll_id && self.user_id == user_id
    }

    pub fn matches(&self, poll_id: &str, option_id: &str, user_id: &str) -> bool {
        self.is_by(poll_id, user_id) && self.option_id == option_id
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({} -> {}/{})", self.user_id, self.poll_id, self.option_id)
    }
}
