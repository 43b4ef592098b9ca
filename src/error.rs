use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};

#[derive(Debug, PartialEq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error: {}", self.message)
    }
}

impl Error for ValidationError {}

pub fn poll_question_missing() -> ValidationError {
    ValidationError {
        message: String::from("poll question is required"),
    }
}

pub fn poll_question_too_long(max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("poll question must be at most {max} characters, got {len}"),
    }
}

pub fn poll_option_limit_exceeded(limits: RangeInclusive<usize>, count: usize) -> ValidationError {
    ValidationError {
        message: format!("poll must have between {} and {} options, got {count}", limits.start(), limits.end()),
    }
}

pub fn poll_option_too_long(index: usize, max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("poll option {index} must be at most {max} characters, got {len}"),
    }
}

pub fn poll_option_duplicate(text: &str, indices: (usize, usize)) -> ValidationError {
    ValidationError {
        message: format!("poll options must be unique, {text:?} appears at indices {indices:?}"),
    }
}

pub fn poll_expiry_not_in_future(expires: &DateTime<Utc>) -> ValidationError {
    ValidationError {
        message: format!("poll expiry must be in the future, got {expires}"),
    }
}


#[derive(Debug)]
pub enum StorageError {
    Io { key: String, source: io::Error },
    InvalidKey(String),
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io { key, source } => write!(f, "storage I/O failed for key {key:?}: {source}"),
            StorageError::InvalidKey(key) => write!(f, "invalid storage key {key:?}"),
            StorageError::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn storage_io(key: &str, source: io::Error) -> StorageError {
    StorageError::Io { key: String::from(key), source }
}

#[derive(Debug, PartialEq)]
pub struct ConfigError {
    key: String,
    message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {}", self.key, self.message)
    }
}

impl Error for ConfigError {}

pub fn config_invalid(key: &str, message: impl Display) -> ConfigError {
    ConfigError {
        key: String::from(key),
        message: message.to_string(),
    }
}

/// Why the store turned down a vote or unvote. The store's boolean operations
/// collapse these to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRefusal {
    PollNotFound,
    PollInactive,
    PollExpired,
    OptionNotFound,
    AlreadyVoted,
    AlreadyVotedForOption,
    VoteNotFound,
}

impl Display for VoteRefusal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            VoteRefusal::PollNotFound => "poll not found",
            VoteRefusal::PollInactive => "poll is no longer active",
            VoteRefusal::PollExpired => "poll has expired",
            VoteRefusal::OptionNotFound => "option does not belong to this poll",
            VoteRefusal::AlreadyVoted => "user has already voted in this poll",
            VoteRefusal::AlreadyVotedForOption => "user has already voted for this option",
            VoteRefusal::VoteNotFound => "user has not voted for this option",
        };
        f.write_str(message)
    }
}

impl Error for VoteRefusal {}
