use chrono::Utc;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::voting::{ContentType, CreatePollRequest, Poll};
use super::{error_reply, login_required, with_locked, SharedStore};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    pub content_type: ContentType,
    pub content_id: String,
}

/// A poll as the poll widget renders it, with its countdown precomputed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,
}

impl From<Poll> for PollView {
    fn from(poll: Poll) -> PollView {
        let now = Utc::now();
        PollView {
            is_expired: poll.is_expired(now),
            time_remaining: poll.time_remaining(now),
            poll,
        }
    }
}

pub fn create(user: Option<String>, request: CreatePollRequest, store: SharedStore) -> Response {
    let Some(user) = user else {
        return login_required();
    };
    let request = match request.validate(Utc::now()) {
        Ok(r) => r,
        Err(err) => {
            return error_reply(StatusCode::BAD_REQUEST, err.message());
        },
    };

    with_locked(&store, |store| {
        let poll = store.create_poll(request, &user);
        reply::with_status(reply::json(&PollView::from(poll)), StatusCode::CREATED).into_response()
    })
}

pub fn list(ContentQuery { content_type, content_id }: ContentQuery, store: SharedStore) -> Response {
    with_locked(&store, |store| {
        let polls: Vec<PollView> = store.polls_for_content(content_type, &content_id)
            .into_iter()
            .map(PollView::from)
            .collect();
        reply::json(&polls).into_response()
    })
}

pub fn get(poll_id: String, store: SharedStore) -> Response {
    with_locked(&store, |store| {
        match store.poll_by_id(&poll_id) {
            Some(poll) => reply::json(&PollView::from(poll)).into_response(),
            None => error_reply(StatusCode::NOT_FOUND, format!("no poll {poll_id}")),
        }
    })
}

pub fn delete(poll_id: String, user: Option<String>, store: SharedStore) -> Response {
    let Some(user) = user else {
        return login_required();
    };

    with_locked(&store, |store| {
        if store.delete_poll(&poll_id, &user) {
            StatusCode::NO_CONTENT.into_response()
        }
        else {
            error_reply(StatusCode::FORBIDDEN, "only the poll's creator can delete it")
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use warp::test::request;

    use crate::web::routes;
    use crate::web::tests::{body_json, create_season_poll, test_store};
    use super::*;

    #[tokio::test]
    async fn create_returns_the_new_poll() {
        let store = test_store();
        let poll = create_season_poll(&store, false).await;

        assert_eq!(poll["question"], "Best season?");
        assert_eq!(poll["createdBy"], "alice");
        assert_eq!(poll["isActive"], true);
        assert_eq!(poll["isExpired"], false);
        assert_eq!(poll["options"][1]["text"], "Winter");
        assert_eq!(poll["options"][1]["votes"], 0);
        assert!(poll.get("timeRemaining").is_none());
    }

    #[tokio::test]
    async fn create_requires_a_user() {
        let response = request()
            .method("POST")
            .path("/api/polls")
            .json(&json!({
                "question": "Best season?",
                "options": ["Summer", "Winter"],
                "contentType": "article",
                "contentId": "article-1"
            }))
            .reply(&routes(test_store()))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_rejects_invalid_requests() {
        let store = test_store();
        let response = request()
            .method("POST")
            .path("/api/polls")
            .header("x-user-id", "alice")
            .json(&json!({
                "question": "Best season?",
                "options": ["Summer", "summer "],
                "contentType": "article",
                "contentId": "article-1"
            }))
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(&response)["error"].as_str().unwrap().contains("unique"));
        assert!(store.lock().unwrap().polls_for_content(ContentType::Article, "article-1").is_empty());
    }

    #[tokio::test]
    async fn create_accepts_date_picker_expiry() {
        let store = test_store();
        let response = request()
            .method("POST")
            .path("/api/polls")
            .header("x-user-id", "alice")
            .json(&json!({
                "question": "Best season?",
                "options": ["Summer", "Winter"],
                "expiresAt": "2099-03-08T18:00",
                "contentType": "article",
                "contentId": "article-1"
            }))
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let poll = body_json(&response);
        assert_eq!(poll["expiresAt"], "2099-03-08T18:00:00Z");
        assert_eq!(poll["isExpired"], false);
        assert!(poll["timeRemaining"].as_str().unwrap().ends_with("remaining"));
    }

    #[tokio::test]
    async fn list_and_get_only_show_what_exists() {
        let store = test_store();
        let poll = create_season_poll(&store, false).await;
        let poll_id = poll["id"].as_str().unwrap();

        let listed = request()
            .method("GET")
            .path("/api/polls?contentType=article&contentId=article-1")
            .reply(&routes(store.clone()))
            .await;
        assert_eq!(listed.status(), StatusCode::OK);
        assert_eq!(body_json(&listed).as_array().unwrap().len(), 1);

        let other = request()
            .method("GET")
            .path("/api/polls?contentType=comment&contentId=article-1")
            .reply(&routes(store.clone()))
            .await;
        assert_eq!(body_json(&other), json!([]));

        let fetched = request()
            .method("GET")
            .path(&format!("/api/polls/{poll_id}"))
            .reply(&routes(store.clone()))
            .await;
        assert_eq!(body_json(&fetched)["id"], poll_id);

        let missing = request()
            .method("GET")
            .path("/api/polls/does-not-exist")
            .reply(&routes(store))
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_limited_to_the_creator() {
        let store = test_store();
        let poll = create_season_poll(&store, false).await;
        let path = format!("/api/polls/{}", poll["id"].as_str().unwrap());

        let by_bob = request()
            .method("DELETE")
            .path(&path)
            .header("x-user-id", "bob")
            .reply(&routes(store.clone()))
            .await;
        assert_eq!(by_bob.status(), StatusCode::FORBIDDEN);

        let by_alice = request()
            .method("DELETE")
            .path(&path)
            .header("x-user-id", "alice")
            .reply(&routes(store.clone()))
            .await;
        assert_eq!(by_alice.status(), StatusCode::NO_CONTENT);

        let listed = request()
            .method("GET")
            .path("/api/polls?contentType=article&contentId=article-1")
            .reply(&routes(store))
            .await;
        assert_eq!(body_json(&listed), json!([]));
    }
}
