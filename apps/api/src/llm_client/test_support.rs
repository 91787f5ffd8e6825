//! In-process fake backends for client tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;

use crate::evaluation::ResumeInput;
use crate::llm_client::HttpClients;

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake backend");
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// Counts requests per endpoint on a fake backend.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn sample_input(resume_text: &str) -> ResumeInput {
    ResumeInput {
        resume_text: resume_text.to_string(),
        job_title: "Data Engineer".to_string(),
        sector: "Healthcare".to_string(),
        experience_level: "Mid".to_string(),
    }
}

pub fn http() -> reqwest::Client {
    reqwest::Client::new()
}

/// Untimed clients for both roles.
pub fn clients() -> HttpClients {
    HttpClients {
        api: http(),
        download: http(),
    }
}
