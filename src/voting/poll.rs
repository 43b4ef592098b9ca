use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use super::id::Id;
use super::request::CreatePollRequest;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Comment,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ContentType::Article => write!(f, "article"),
            ContentType::Comment => write!(f, "comment"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: Id,
    pub text: String,
    pub votes: u32,
    pub voters: Vec<String>,
}

impl PollOption {
    pub fn new(text: String) -> PollOption {
        PollOption {
            id: Id::new(),
            text,
            votes: 0,
            voters: vec![],
        }
    }

    pub(crate) fn add_voter(&mut self, user_id: &str) {
        self.votes += 1;
        self.voters.push(String::from(user_id));
    }

    /// Counts never drop below zero, even when they had already drifted from
    /// the vote collection.
    pub(crate) fn remove_voter(&mut self, user_id: &str) {
        self.votes = self.votes.saturating_sub(1);
        if let Some(index) = self.voters.iter().position(|v| v == user_id) {
            self.voters.remove(index);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Id,
    pub question: String,
    pub options: Vec<PollOption>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient_expiry")]
    pub expires_at: Option<DateTime<Utc>>,

    pub allow_multiple_votes: bool,
    pub is_active: bool,

    pub content_type: ContentType,
    pub content_id: String,
}

impl Poll {
    pub fn new(request: CreatePollRequest, created_by: &str) -> Poll {
        let CreatePollRequest {
            question,
            options,
            allow_multiple_votes,
            expires_at,
            content_type,
            content_id,
        } = request;

        Poll {
            id: Id::new(),
            question,
            options: options.into_iter().map(PollOption::new).collect(),
            created_by: String::from(created_by),
            created_at: Utc::now(),
            expires_at,
            allow_multiple_votes,
            is_active: true,
            content_type,
            content_id,
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub(crate) fn option_mut(&mut self, option_id: &str) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|o| o.id == option_id)
    }

    pub fn is_attached_to(&self, content_type: ContentType, content_id: &str) -> bool {
        self.content_type == content_type && self.content_id == content_id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires) if expires < now)
    }

    /// Human readable countdown to the poll's expiry, e.g. "2d 3h remaining".
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<String> {
        let expires = self.expires_at?;
        let left = expires.signed_duration_since(now);
        if left.num_milliseconds() <= 0 {
            return Some(String::from("Expired"));
        }

        let days = left.num_days();
        let hours = left.num_hours() % 24;
        let minutes = left.num_minutes() % 60;

        let text = if days > 0 {
            format!("{days}d {hours}h remaining")
        }
        else if hours > 0 {
            format!("{hours}h {minutes}m remaining")
        }
        else {
            format!("{minutes}m remaining")
        };
        Some(text)
    }
}

/// Expiry values may have been written by a browser date picker without an
/// offset; those are read as UTC.
pub(super) mod lenient_expiry {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use tracing::warn;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => dt.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Stored polls keep loading when their expiry is unreadable; the poll
    /// is treated as having none.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => {
                let parsed = parse(&s);
                if parsed.is_none() {
                    warn!("Ignoring unrecognized expiry timestamp {s:?}");
                }
                Ok(parsed)
            },
        }
    }

    /// Request input is rejected when its expiry is unreadable.
    pub fn deserialize_strict<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognized expiry timestamp {s:?}"))),
        }
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    fn sample_request(expires_at: Option<DateTime<Utc>>) -> CreatePollRequest {
        CreatePollRequest {
            question: String::from("Best season?"),
            options: vec![String::from("Summer"), String::from("Winter")],
            allow_multiple_votes: false,
            expires_at,
            content_type: ContentType::Article,
            content_id: String::from("42"),
        }
    }

    #[test]
    fn new_poll_starts_empty_and_active() {
        let poll = Poll::new(sample_request(None), "alice");

        assert!(poll.is_active);
        assert_eq!(poll.created_by, "alice");
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.options[0].text, "Summer");
        assert_eq!(poll.options[1].text, "Winter");
        assert_ne!(poll.options[0].id, poll.options[1].id);
        assert!(poll.options.iter().all(|o| o.votes == 0 && o.voters.is_empty()));
    }

    #[test]
    fn persisted_layout_uses_camel_case_and_omits_missing_expiry() {
        let poll = Poll::new(sample_request(None), "alice");
        let value = serde_json::to_value(&poll).unwrap();

        assert_eq!(value["createdBy"], "alice");
        assert_eq!(value["allowMultipleVotes"], false);
        assert_eq!(value["isActive"], true);
        assert_eq!(value["contentType"], "article");
        assert_eq!(value["contentId"], "42");
        assert_eq!(value["options"][0]["votes"], 0);
        assert_eq!(value["options"][0]["voters"], json!([]));
        assert!(value.get("expiresAt").is_none());
    }

    #[test]
    fn reads_documents_written_by_the_browser() {
        let raw = json!({
            "id": "lx3k9a0bq1",
            "question": "Tabs or spaces?",
            "options": [
                {"id": "o1", "text": "Tabs", "votes": 1, "voters": ["bob"]},
                {"id": "o2", "text": "Spaces", "votes": 0, "voters": []}
            ],
            "createdBy": "bob",
            "createdAt": "2024-03-01T09:30:00.000Z",
            "expiresAt": "2024-03-08T18:00",
            "allowMultipleVotes": true,
            "isActive": true,
            "contentType": "comment",
            "contentId": "c-7"
        });

        let poll: Poll = serde_json::from_value(raw).unwrap();
        assert_eq!(poll.content_type, ContentType::Comment);
        assert_eq!(poll.expires_at, Some(Utc.with_ymd_and_hms(2024, 3, 8, 18, 0, 0).unwrap()));
        assert_eq!(poll.option("o1").unwrap().voters, vec!["bob"]);
    }

    #[test]
    fn lenient_expiry_accepts_plain_dates_and_rejects_garbage() {
        assert_eq!(
            lenient_expiry::parse("2024-12-25"),
            Some(Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap()),
        );
        assert_eq!(
            lenient_expiry::parse("2024-12-25T08:15:30"),
            Some(Utc.with_ymd_and_hms(2024, 12, 25, 8, 15, 30).unwrap()),
        );
        assert_eq!(lenient_expiry::parse("next tuesday"), None);
    }

    #[test]
    fn unreadable_stored_expiry_reads_as_none() {
        let raw = json!({
            "id": "p2",
            "question": "Lunch?",
            "options": [{"id": "o1", "text": "Pizza", "votes": 0, "voters": []}],
            "createdBy": "bob",
            "createdAt": "2024-03-01T09:30:00.000Z",
            "expiresAt": "03/08/2099",
            "allowMultipleVotes": false,
            "isActive": true,
            "contentType": "article",
            "contentId": "42"
        });

        let poll: Poll = serde_json::from_value(raw).unwrap();
        assert_eq!(poll.expires_at, None);
        assert_eq!(poll.question, "Lunch?");
    }

    #[test]
    fn expiry_is_strictly_in_the_past() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let poll = Poll::new(sample_request(Some(now)), "alice");

        assert!(!poll.is_expired(now));
        assert!(poll.is_expired(now + Duration::seconds(1)));
        assert!(!Poll::new(sample_request(None), "alice").is_expired(now));
    }

    #[test]
    fn time_remaining_formats_like_the_poll_widget() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let remaining = |d: Duration| Poll::new(sample_request(Some(now + d)), "alice").time_remaining(now);

        assert_eq!(remaining(Duration::days(2) + Duration::hours(3)).as_deref(), Some("2d 3h remaining"));
        assert_eq!(remaining(Duration::hours(5) + Duration::minutes(7)).as_deref(), Some("5h 7m remaining"));
        assert_eq!(remaining(Duration::minutes(42)).as_deref(), Some("42m remaining"));
        assert_eq!(remaining(Duration::zero()).as_deref(), Some("Expired"));
        assert_eq!(remaining(-Duration::hours(1)).as_deref(), Some("Expired"));
        assert_eq!(Poll::new(sample_request(None), "alice").time_remaining(now), None);
    }

    #[test]
    fn remove_voter_clamps_at_zero() {
        let mut option = PollOption::new(String::from("Summer"));
        option.remove_voter("alice");
        assert_eq!(option.votes, 0);

        option.add_voter("alice");
        option.add_voter("bob");
        option.remove_voter("alice");
        assert_eq!(option.votes, 1);
        assert_eq!(option.voters, vec!["bob"]);
    }
}
