use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use super::{error_reply, with_locked, SharedStore};

pub fn get(poll_id: String, store: SharedStore) -> Response {
    with_locked(&store, |store| {
        match store.results(&poll_id) {
            Some(results) => reply::json(&results).into_response(),
            None => error_reply(StatusCode::NOT_FOUND, format!("no poll {poll_id}")),
        }
    })
}

#[cfg(test)]
mod tests {
    use warp::test::request;

    use crate::web::routes;
    use crate::web::tests::{body_json, create_season_poll, test_store};
    use super::*;

    #[tokio::test]
    async fn results_for_a_fresh_poll_are_zero() {
        let store = test_store();
        let poll = create_season_poll(&store, false).await;

        let response = request()
            .method("GET")
            .path(&format!("/api/polls/{}/results", poll["id"].as_str().unwrap()))
            .reply(&routes(store))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let results = body_json(&response);
        assert_eq!(results["totalVotes"], 0);
        assert_eq!(results["options"][0]["text"], "Summer");
        assert_eq!(results["options"][0]["percentage"], 0.0);
        assert_eq!(results["options"][1]["percentage"], 0.0);
    }

    #[tokio::test]
    async fn results_for_unknown_poll_are_not_found() {
        let response = request()
            .method("GET")
            .path("/api/polls/unknown/results")
            .reply(&routes(test_store()))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
