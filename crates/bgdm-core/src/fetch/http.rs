//! Blocking HTTP GET for one asset, run via `spawn_blocking` so curl's
//! synchronous transfer never sits on the async runtime.

use super::error::FetchError;
use std::time::Duration;

/// Per-run HTTP settings shared by every fetch task.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Descriptive client identifier sent with every request.
    pub user_agent: String,
    /// Bound on the total transfer time of one GET.
    pub timeout: Duration,
}

/// Issues one GET and buffers the full body. Non-200 statuses are errors so
/// the retry loop sees them uniformly with transport failures.
pub fn get_bytes(url: &str, opts: &HttpOptions) -> Result<Vec<u8>, FetchError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(FetchError::Curl)?;
    easy.follow_location(true).map_err(FetchError::Curl)?;
    easy.max_redirections(10).map_err(FetchError::Curl)?;
    easy.useragent(&opts.user_agent).map_err(FetchError::Curl)?;
    easy.connect_timeout(Duration::from_secs(30))
        .map_err(FetchError::Curl)?;
    easy.timeout(opts.timeout).map_err(FetchError::Curl)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(FetchError::Curl)?;
        transfer.perform().map_err(FetchError::Curl)?;
    }

    let code = easy.response_code().map_err(FetchError::Curl)?;
    if code != 200 {
        return Err(FetchError::Http(code));
    }
    Ok(body)
}
