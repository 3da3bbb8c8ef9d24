use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::to_bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use observability_deps::tracing::info;

use crate::middleware::{auth, logging, memory};
use crate::state::AppState;
use crate::{handlers, worker};

/// Binds and serves the HTTP surface (spec §6), running until the process is signalled to
/// shut down. Mirrors the way `ioxd_common::server_type` wires a `hyper::Server` over a
/// `make_service_fn`/`service_fn` pair rather than reaching for a routing framework.
pub async fn serve(bind_addr: SocketAddr, state: Arc<AppState>) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(dispatch(state, req).await) }
            }))
        }
    });

    info!(%bind_addr, "starting HTTP server");
    Server::bind(&bind_addr).serve(make_svc).await
}

/// Spawns the pull-worker loops for every configured subscription (spec §5/§6 `subscriptions`).
pub fn spawn_pull_workers(
    state: Arc<AppState>,
    subscriber: Arc<dyn swarm_capabilities::Subscriber>,
    subscriptions: Vec<String>,
) -> Vec<tokio::task::JoinHandle<()>> {
    subscriptions
        .into_iter()
        .map(|subscription| {
            let state = state.clone();
            let subscriber = subscriber.clone();
            tokio::spawn(worker::run(state, subscriber, subscription))
        })
        .collect()
}

async fn dispatch(state: Arc<AppState>, req: Request<Body>) -> Response<Body> {
    let started_at = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let remote = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = route(&state, req, &remote).await;

    logging::access(&method, &path, &remote, response.status().as_u16(), started_at);
    response
}

async fn route(state: &Arc<AppState>, req: Request<Body>, remote: &str) -> Response<Body> {
    if let Some(resp) = memory::check(state.memory_limit) {
        return resp;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let headers = req.headers().clone();

    if method == Method::GET && path == "/health" {
        return handlers::health();
    }

    if path != "/event/pubsub/cs" && path != "/event/pubsub/swarm" {
        return not_found();
    }
    if method != Method::POST {
        return method_not_allowed();
    }

    let body = match to_bytes(req.into_body()).await {
        Ok(bytes) => bytes.to_vec(),
        Err(_) => return bad_request("failed to read request body"),
    };

    if let Err(_err) = auth::authorize(state.policy.as_ref(), method.as_str(), &path, remote, &query, &headers, &body).await {
        return Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::from("unauthorized"))
            .unwrap();
    }

    match path.as_str() {
        "/event/pubsub/cs" => handlers::handle_pubsub_cs(state, &body).await,
        "/event/pubsub/swarm" => handlers::handle_pubsub_swarm(state, &body).await,
        _ => not_found(),
    }
}

fn not_found() -> Response<Body> {
    Response::builder().status(StatusCode::NOT_FOUND).body(Body::empty()).unwrap()
}

fn method_not_allowed() -> Response<Body> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .body(Body::empty())
        .unwrap()
}

fn bad_request(message: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(Body::from(message.to_string()))
        .unwrap()
}
