use std::sync::Arc;
use serde_json::Value;
use crate::error::Error;
use super::reqwest::ReqwestClient;

/// Lines of a streamed response body, read on demand.
pub type LineStream = Box<dyn Iterator<Item = Result<String, Error>> + Send>;

/// Request client.
pub trait Client: Send + Sync {
    /// Send request and receive response.
    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error>;

    /// Send request and return the response body line by line.
    /// Each line is read from the network only when the iterator is advanced.
    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<LineStream, Error>;
}

/// Create reqwest client.
pub fn get_reqwest_client() -> Result<Arc<dyn Client>, Error> {
    Ok(Arc::new(ReqwestClient::new()?))
}
