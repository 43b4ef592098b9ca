mod poll_api;
mod result_api;
mod vote_api;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::signal;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use crate::storage::Storage;
use crate::store::PollStore;

pub type SharedStore = Arc<Mutex<PollStore<Box<dyn Storage>>>>;

const USER_HEADER: &str = "x-user-id";

pub fn shared(store: PollStore<Box<dyn Storage>>) -> SharedStore {
    Arc::new(Mutex::new(store))
}

pub fn routes(store: SharedStore) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create_poll = warp::path!("api" / "polls")
        .and(warp::post())
        .and(current_user())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .map(poll_api::create);

    let list_polls = warp::path!("api" / "polls")
        .and(warp::get())
        .and(warp::query::<poll_api::ContentQuery>())
        .and(with_store(store.clone()))
        .map(poll_api::list);

    let get_poll = warp::path!("api" / "polls" / String)
        .and(warp::get())
        .and(with_store(store.clone()))
        .map(poll_api::get);

    let delete_poll = warp::path!("api" / "polls" / String)
        .and(warp::delete())
        .and(current_user())
        .and(with_store(store.clone()))
        .map(poll_api::delete);

    let vote = warp::path!("api" / "polls" / String / "votes" / String)
        .and(warp::post())
        .and(current_user())
        .and(with_store(store.clone()))
        .map(vote_api::vote);

    let unvote = warp::path!("api" / "polls" / String / "votes" / String)
        .and(warp::delete())
        .and(current_user())
        .and(with_store(store.clone()))
        .map(vote_api::unvote);

    let toggle = warp::path!("api" / "polls" / String / "votes" / String)
        .and(warp::put())
        .and(current_user())
        .and(with_store(store.clone()))
        .map(vote_api::toggle);

    let user_votes = warp::path!("api" / "polls" / String / "votes")
        .and(warp::get())
        .and(current_user())
        .and(with_store(store.clone()))
        .map(vote_api::user_votes);

    let results = warp::path!("api" / "polls" / String / "results")
        .and(warp::get())
        .and(with_store(store))
        .map(result_api::get);

    create_poll
        .or(list_polls)
        .or(get_poll)
        .or(delete_poll)
        .or(vote)
        .or(unvote)
        .or(toggle)
        .or(user_votes)
        .or(results)
}

pub async fn serve(store: SharedStore, port: u16) {
    let routes = routes(store).with(warp::trace::request());
    let address = SocketAddr::from(([0, 0, 0, 0], port));

    let (bound, server) = warp::serve(routes)
        .bind_with_graceful_shutdown(address, shutdown_signal());
    info!("Server running on {bound}");

    server.await;
    info!("Server shut down");
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

fn with_store(store: SharedStore) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn current_user() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>(USER_HEADER)
        .map(|user: Option<String>| user.filter(|u| !u.trim().is_empty()))
}

/// Runs `f` against the locked store, or answers 500 if a previous request
/// panicked while holding it.
fn with_locked(store: &SharedStore, f: impl FnOnce(&PollStore<Box<dyn Storage>>) -> Response) -> Response {
    match store.lock() {
        Ok(guard) => f(&*guard),
        Err(_) => {
            error!("Poll store lock poisoned");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "poll store unavailable")
        },
    }
}

fn error_reply(code: StatusCode, message: impl AsRef<str>) -> Response {
    reply::with_status(reply::json(&json!({ "error": message.as_ref() })), code).into_response()
}

fn login_required() -> Response {
    error_reply(StatusCode::UNAUTHORIZED, "you must be logged in")
}
