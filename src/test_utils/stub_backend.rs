//! A stand-in for the budget API that records the requests it receives.

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{
        HeaderMap, Method,
        header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderName},
    },
    middleware::{self, Next},
};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::{AppState, api::ApiClient};

/// A request received by the stub backend.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub cookie: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    /// The JSON body, or `Value::Null` if the body was empty or not JSON.
    pub body: Value,
}

pub(crate) struct StubBackend {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

impl StubBackend {
    /// Serve `routes` on an ephemeral local port.
    pub(crate) async fn start(routes: Router) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorder = requests.clone();

        let app = routes.layer(middleware::from_fn(
            move |request: Request, next: Next| {
                let recorder = recorder.clone();

                async move {
                    let (parts, body) = request.into_parts();
                    let bytes = axum::body::to_bytes(body, usize::MAX)
                        .await
                        .expect("Could not read stub request body");

                    let recorded = RecordedRequest {
                        method: parts.method.clone(),
                        path: parts.uri.path().to_owned(),
                        cookie: header_string(&parts.headers, COOKIE),
                        accept: header_string(&parts.headers, ACCEPT),
                        content_type: header_string(&parts.headers, CONTENT_TYPE),
                        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
                    };
                    recorder.lock().unwrap().push(recorded);

                    next.run(Request::from_parts(parts, Body::from(bytes))).await
                }
            },
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind stub backend");
        let address = listener.local_addr().expect("Stub backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Stub backend stopped unexpectedly");
        });

        Self {
            url: format!("http://{address}"),
            requests,
        }
    }

    /// A client pointing at a local port nothing is listening on.
    pub(crate) async fn unreachable_client() -> ApiClient {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind a free port");
        let address = listener.local_addr().expect("Free port listener has no address");
        drop(listener);

        ApiClient::new(&format!("http://{address}")).expect("Could not create client")
    }

    pub(crate) fn client(&self) -> ApiClient {
        ApiClient::new(&self.url).expect("Could not create client")
    }

    /// App state that talks to this backend, with "BGN" amounts and UTC dates.
    pub(crate) fn state(&self) -> AppState {
        AppState::new(&self.url, "BGN", "Etc/UTC").expect("Could not create app state")
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The recorded requests with the given method and path.
    pub(crate) fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }
}
