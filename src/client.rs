//! HTTP client seam: GET/PUT JSON against a configurable base address.

use crate::error::RequestError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Base address prepended to relative urls in later calls.
    fn set_base_url(&self, base_url: &str);

    async fn get_json(&self, url: &str) -> Result<Value, RequestError>;

    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, RequestError>;
}

/// Join a relative url onto a base the way browser HTTP clients do: absolute urls pass through.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> Result<String, RequestError> {
    if Url::parse(url).is_ok() {
        return Ok(url.to_string());
    }
    let base = base_url.ok_or_else(|| RequestError::Url(url.to_string()))?;
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|_| RequestError::Url(joined.clone()))?;
    Ok(joined)
}

pub struct ReqwestClient {
    client: Client,
    base_url: RwLock<Option<String>>,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, RequestError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, RequestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(ReqwestClient {
            client,
            base_url: RwLock::new(None),
        })
    }

    fn resolve(&self, url: &str) -> Result<String, RequestError> {
        let guard = self.base_url.read().unwrap_or_else(|e| e.into_inner());
        resolve_url(guard.as_deref(), url)
    }

    async fn read_json(method: &'static str, url: &str, response: reqwest::Response) -> Result<Value, RequestError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| RequestError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    fn set_base_url(&self, base_url: &str) {
        let mut guard = self.base_url.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(base_url.to_string());
    }

    async fn get_json(&self, url: &str) -> Result<Value, RequestError> {
        let url = self.resolve(url)?;
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::read_json("GET", &url, response).await
    }

    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, RequestError> {
        let url = self.resolve(url)?;
        tracing::debug!(url = %url, "PUT");
        let response = self.client.put(&url).json(body).send().await?;
        Self::read_json("PUT", &url, response).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted client: canned responses per url, every request recorded.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Hook = Box<dyn Fn(&str) + Send + Sync>;

    #[derive(Default)]
    pub struct ScriptedClient {
        base_url: Mutex<Option<String>>,
        responses: Mutex<HashMap<(String, String), Result<Value, String>>>,
        requests: Mutex<Vec<(String, String)>>,
        bodies: Mutex<Vec<Value>>,
        before_response: Mutex<Option<Hook>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            ScriptedClient::default()
        }

        pub fn on_get(&self, url: &str, body: Value) {
            self.script("GET", url, Ok(body));
        }

        pub fn fail_get(&self, url: &str, message: &str) {
            self.script("GET", url, Err(message.to_string()));
        }

        pub fn on_put(&self, url: &str, body: Value) {
            self.script("PUT", url, Ok(body));
        }

        pub fn fail_put(&self, url: &str, message: &str) {
            self.script("PUT", url, Err(message.to_string()));
        }

        /// Runs with the request url after it is recorded and before the response is returned.
        pub fn before_response<F>(&self, hook: F)
        where
            F: Fn(&str) + Send + Sync + 'static,
        {
            *self.before_response.lock().unwrap() = Some(Box::new(hook));
        }

        fn script(&self, method: &str, url: &str, outcome: Result<Value, String>) {
            self.responses
                .lock()
                .unwrap()
                .insert((method.to_string(), url.to_string()), outcome);
        }

        pub fn base_url(&self) -> Option<String> {
            self.base_url.lock().unwrap().clone()
        }

        pub fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().unwrap().clone()
        }

        pub fn put_bodies(&self) -> Vec<Value> {
            self.bodies.lock().unwrap().clone()
        }

        fn respond(&self, method: &str, url: &str) -> Result<Value, RequestError> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), url.to_string()));
            if let Some(hook) = self.before_response.lock().unwrap().as_ref() {
                hook(url);
            }
            match self
                .responses
                .lock()
                .unwrap()
                .get(&(method.to_string(), url.to_string()))
            {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(m)) => Err(RequestError::Transport(m.clone())),
                None => Err(RequestError::Status {
                    method: if method == "PUT" { "PUT" } else { "GET" },
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        fn set_base_url(&self, base_url: &str) {
            *self.base_url.lock().unwrap() = Some(base_url.to_string());
        }

        async fn get_json(&self, url: &str) -> Result<Value, RequestError> {
            self.respond("GET", url)
        }

        async fn put_json(&self, url: &str, body: &Value) -> Result<Value, RequestError> {
            self.bodies.lock().unwrap().push(body.clone());
            self.respond("PUT", url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_url_is_joined_on_base() {
        let url = resolve_url(Some("https://portal.example.org/data-fair/api/v1/"), "/applications/x").unwrap();
        assert_eq!(url, "https://portal.example.org/data-fair/api/v1/applications/x");
    }

    #[test]
    fn absolute_url_ignores_base() {
        let url = resolve_url(Some("https://a.org/api/v1"), "https://b.org/datasets/d1").unwrap();
        assert_eq!(url, "https://b.org/datasets/d1");
    }

    #[test]
    fn relative_url_without_base_fails() {
        assert!(matches!(resolve_url(None, "/applications/x"), Err(RequestError::Url(_))));
    }

    #[test]
    fn set_base_url_is_used_for_relative_requests() {
        let client = ReqwestClient::new().unwrap();
        client.set_base_url("https://a.org/api/v1");
        assert_eq!(client.resolve("/datasets/d1").unwrap(), "https://a.org/api/v1/datasets/d1");
    }
}
