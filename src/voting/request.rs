use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use super::poll::{lenient_expiry, ContentType};
use crate::error::{self, ValidationError};

pub const QUESTION_MAX_CHARS: usize = 200;
pub const OPTION_MAX_CHARS: usize = 100;
pub const OPTION_LIMITS: RangeInclusive<usize> = 2..=10;

/// Input to poll creation. The store accepts it as-is; callers that take
/// user input should run [`CreatePollRequest::validate`] first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple_votes: bool,
    #[serde(default, deserialize_with = "lenient_expiry::deserialize_strict")]
    pub expires_at: Option<DateTime<Utc>>,
    pub content_type: ContentType,
    pub content_id: String,
}

impl CreatePollRequest {
    /// Trims the question and options, drops blank options, and checks the
    /// result against the creation limits.
    pub fn validate(self, now: DateTime<Utc>) -> Result<CreatePollRequest, ValidationError> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(error::poll_question_missing());
        }
        let question_len = question.chars().count();
        if question_len > QUESTION_MAX_CHARS {
            return Err(error::poll_question_too_long(QUESTION_MAX_CHARS, question_len));
        }

        let options: Vec<String> = self.options.iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
        if !OPTION_LIMITS.contains(&options.len()) {
            return Err(error::poll_option_limit_exceeded(OPTION_LIMITS, options.len()));
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (index, option) in options.iter().enumerate() {
            let len = option.chars().count();
            if len > OPTION_MAX_CHARS {
                return Err(error::poll_option_too_long(index, OPTION_MAX_CHARS, len));
            }
            if let Some(first) = seen.insert(option.to_lowercase(), index) {
                return Err(error::poll_option_duplicate(option, (first, index)));
            }
        }

        if let Some(expires) = self.expires_at {
            if expires <= now {
                return Err(error::poll_expiry_not_in_future(&expires));
            }
        }

        Ok(CreatePollRequest { question, options, ..self })
    }
}
