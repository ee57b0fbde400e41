use std::io::{BufRead, BufReader};
use reqwest::blocking::{Client as BlockingClient, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use crate::error::Error;
use crate::llm::check_for_error;
use crate::request::client::{Client, LineStream};

pub struct ReqwestClient {
    client: BlockingClient,
}

impl ReqwestClient {

    pub fn new() -> Result<Self, Error> {
        // No request timeout at this layer.
        let client = BlockingClient::builder()
            .timeout(None)
            .build()?;
        Ok(ReqwestClient { client })
    }

    fn prepare(&self, url: &str, payload: &Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> RequestBuilder {
        let mut request = self.client
            .post(url)
            .query(params)
            .json(payload);

        for (k, v) in headers {
            request = request.header(*k, *v);
        }

        request
    }

    /// Error for a non-success status. A readable error body wins over the bare status.
    fn failure(status: u16, body: String) -> Error {
        if let Ok(ret) = serde_json::from_str::<Value>(&body) {
            if let Err(err) = check_for_error(&ret) {
                return err;
            }
        }
        Error::HttpStatus { status, body }
    }
}

impl Client for ReqwestClient {

    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        debug!(url, "sending request");

        let response = self.prepare(url, &payload, headers, params).send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(url, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(Self::failure(status.as_u16(), body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<LineStream, Error> {
        debug!(url, "sending streaming request");

        let response = self.prepare(url, &payload, headers, params).send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(Self::failure(status, response.text().unwrap_or_default()));
        }

        let lines = BufReader::new(response)
            .lines()
            .map(|line| line.map_err(Error::from));

        Ok(Box::new(lines))
    }
}
