use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::error::VoteRefusal;
use crate::storage::Storage;
use crate::store::PollStore;
use crate::voting::Id;
use super::{error_reply, login_required, with_locked, SharedStore};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserVotes {
    has_voted: bool,
    option_ids: Vec<Id>,
}

fn refusal_reply(refusal: VoteRefusal) -> Response {
    let code = match refusal {
        VoteRefusal::PollNotFound | VoteRefusal::OptionNotFound | VoteRefusal::VoteNotFound => StatusCode::NOT_FOUND,
        VoteRefusal::PollInactive | VoteRefusal::PollExpired => StatusCode::GONE,
        VoteRefusal::AlreadyVoted | VoteRefusal::AlreadyVotedForOption => StatusCode::CONFLICT,
    };
    error_reply(code, refusal.to_string())
}

/// Answers with the poll's updated results after a successful change.
fn changed(
    store: SharedStore,
    user: Option<String>,
    apply: impl FnOnce(&PollStore<Box<dyn Storage>>, &str) -> Result<(), VoteRefusal>,
    poll_id: &str,
) -> Response {
    let Some(user) = user else {
        return login_required();
    };

    with_locked(&store, |store| {
        if let Err(refusal) = apply(store, user.as_str()) {
            return refusal_reply(refusal);
        }
        match store.results(poll_id) {
            Some(results) => reply::json(&results).into_response(),
            None => refusal_reply(VoteRefusal::PollNotFound),
        }
    })
}

pub fn vote(poll_id: String, option_id: String, user: Option<String>, store: SharedStore) -> Response {
    changed(store, user, |store, user| store.try_vote(&poll_id, &option_id, user), &poll_id)
}

pub fn unvote(poll_id: String, option_id: String, user: Option<String>, store: SharedStore) -> Response {
    changed(store, user, |store, user| store.try_unvote(&poll_id, &option_id, user), &poll_id)
}

pub fn toggle(poll_id: String, option_id: String, user: Option<String>, store: SharedStore) -> Response {
    changed(store, user, |store, user| store.try_toggle_vote(&poll_id, &option_id, user), &poll_id)
}

pub fn user_votes(poll_id: String, user: Option<String>, store: SharedStore) -> Response {
    let Some(user) = user else {
        return login_required();
    };

    with_locked(&store, |store| {
        let votes = UserVotes {
            has_voted: store.has_voted(&poll_id, &user),
            option_ids: store.user_votes(&poll_id, &user),
        };
        reply::json(&votes).into_response()
    })
}
