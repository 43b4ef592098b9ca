mod id;
mod poll;
mod poll_result;
mod request;
mod vote;

pub use id::Id;
pub use poll::{ContentType, Poll, PollOption};
pub use poll_result::{OptionResult, PollResults};
pub use request::{CreatePollRequest, OPTION_LIMITS, OPTION_MAX_CHARS, QUESTION_MAX_CHARS};
pub use vote::Vote;
