use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::{extract_message, ApiError, GENERIC_FAILURE_MESSAGE};
use super::transport::Transport;
use crate::config::ApiConfig;

/// reqwest-backed transport carrying the operator's session cookie.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &config.session_cookie {
            let mut value =
                HeaderValue::from_str(cookie.trim()).map_err(|_| ApiError::Transport {
                    path: config.base_url.to_string(),
                    detail: "session cookie is not a valid header value".to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::Transport {
                path: config.base_url.to_string(),
                detail: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidUrl {
                path: path.to_string(),
                source,
            })
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|err| ApiError::Transport {
            path: path.to_string(),
            detail: err.to_string(),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| ApiError::Transport {
            path: path.to_string(),
            detail: err.to_string(),
        })?;
        debug!(%path, status = status.as_u16(), bytes = bytes.len(), "api response");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice::<Value>(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        if !status.is_success() {
            let message =
                extract_message(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            warn!(%path, status = status.as_u16(), %message, "api request rejected");
            return Err(ApiError::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let request = self.client.get(url).query(query);
        self.execute(path, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let request = self.client.post(url).json(body);
        self.execute(path, request).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let request = self.client.patch(url).json(body);
        self.execute(path, request).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let request = self.client.delete(url);
        self.execute(path, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_below_base_prefix() {
        let config = ApiConfig::new("http://127.0.0.1:3000/api", None).expect("valid url");
        let transport = HttpTransport::new(&config).expect("client builds");
        let url = transport
            .url("/students/status/pending/list")
            .expect("joins");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:3000/api/students/status/pending/list"
        );
    }

    #[test]
    fn rejects_cookie_with_control_characters() {
        let config = ApiConfig::new("http://127.0.0.1:3000/api/", Some("a\nb".to_string()))
            .expect("valid url");
        let err = HttpTransport::new(&config).expect_err("newline rejected");
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
