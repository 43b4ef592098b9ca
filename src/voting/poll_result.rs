use serde::Serialize;

use super::id::Id;
use super::poll::Poll;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResult {
    pub id: Id,
    pub text: String,
    pub votes: u32,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub total_votes: u64,
    pub options: Vec<OptionResult>,
}

impl PollResults {
    /// Tallies the poll's own counters. Percentages are left unrounded.
    pub fn evaluate(poll: &Poll) -> PollResults {
        let total_votes: u64 = poll.options.iter().map(|o| o.votes as u64).sum();

        let options = poll.options.iter()
            .map(|option| OptionResult {
                id: option.id.clone(),
                text: option.text.clone(),
                votes: option.votes,
                percentage: if total_votes > 0 {
                    option.votes as f64 / total_votes as f64 * 100.0
                }
                else {
                    0.0
                },
            })
            .collect();

        PollResults { total_votes, options }
    }
}
