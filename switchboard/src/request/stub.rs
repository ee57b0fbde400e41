//! Only for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use serde_json::Value;
use crate::error::Error;
use crate::request::client::{Client, LineStream};

/// Request captured by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    /// Target URL.
    pub url: String,
    /// JSON body.
    pub payload: Value,
    /// Headers.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub params: Vec<(String, String)>,
}

/// Canned answer.
pub enum Reply {
    /// JSON body.
    Json(Value),
    /// Streamed body lines.
    Lines(Vec<String>),
    /// Transport or backend failure.
    Fail(Error),
}

/// Client for tests. Replays replies in order and records every request.
#[derive(Default)]
pub struct StubClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

impl StubClient {

    /// Create client with no replies queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply.
    pub fn reply_json(self, body: Value) -> Self {
        self.push(Reply::Json(body))
    }

    /// Queue a streamed reply.
    pub fn reply_lines(self, lines: &[&str]) -> Self {
        self.push(Reply::Lines(lines.iter().map(|l| l.to_string()).collect()))
    }

    /// Queue a failure.
    pub fn reply_err(self, err: Error) -> Self {
        self.push(Reply::Fail(err))
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Reply {
        self.requests.lock().unwrap().push(Recorded {
            url: url.to_owned(),
            payload,
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
        self.replies.lock().unwrap().pop_front().expect("stub reply queued")
    }
}

impl Client for StubClient {

    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        match self.record(url, payload, headers, params) {
            Reply::Json(body) => Ok(body),
            Reply::Lines(_) => panic!("stub: streamed reply queued for a json request"),
            Reply::Fail(err) => Err(err),
        }
    }

    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<LineStream, Error> {
        match self.record(url, payload, headers, params) {
            Reply::Lines(lines) => Ok(Box::new(lines.into_iter().map(Ok))),
            Reply::Json(_) => panic!("stub: json reply queued for a streaming request"),
            Reply::Fail(err) => Err(err),
        }
    }
}
