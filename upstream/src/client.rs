use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::FetchError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP method plus how parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters go in the query string.
    Get,
    /// Parameters go in a url-encoded form body.
    PostForm,
    /// Parameters go in a url-encoded form body.
    PutForm,
}

/// Descriptor for a named upstream endpoint. Immutable, defined at compile time.
pub trait Endpoint {
    /// Name used in logs and error messages.
    const NAME: &'static str;
    /// Path relative to the client's base URL.
    const PATH: &'static str;
    const METHOD: Method;
    /// Expected response shape.
    type Response: DeserializeOwned;
}

/// Single-round-trip HTTP access to one upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for `E` with `params` in the query string.
    ///
    /// Also used to build display links, so callers choose which params to expose.
    #[must_use]
    pub fn endpoint_url<E: Endpoint>(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", self.base_url.path().trim_end_matches('/'), E::PATH);
        url.set_path(&path);
        append_query(&mut url, params);
        url
    }

    /// Issue `E` and return the raw body. Decoding is the caller's job.
    pub async fn request<E: Endpoint>(&self, params: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
        let url = self.endpoint_url::<E>(&[]);
        self.fetch(E::NAME, E::METHOD, url, params).await
    }

    /// Issue `E` and decode the body into its expected shape.
    pub async fn call<E: Endpoint>(&self, params: &[(&str, &str)]) -> Result<E::Response, FetchError> {
        let body = self.request::<E>(params).await?;
        decode(E::NAME, &body)
    }

    /// One HTTP round trip against an absolute URL.
    ///
    /// Non-2xx statuses become [`FetchError::Protocol`]; send, read and timeout
    /// failures become [`FetchError::Transport`].
    pub async fn fetch(
        &self,
        name: &str,
        method: Method,
        mut url: Url,
        params: &[(&str, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        let builder = match method {
            Method::Get => {
                append_query(&mut url, params);
                self.http.get(url)
            }
            Method::PostForm => self
                .http
                .post(url)
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(encode_form(params)),
            Method::PutForm => self
                .http
                .put(url)
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(encode_form(params)),
        };

        let response = builder.send().await.map_err(|source| FetchError::Transport {
            endpoint: name.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol {
                endpoint: name.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Transport {
            endpoint: name.to_string(),
            source,
        })?;
        tracing::trace!(endpoint = name, bytes = body.len(), "Upstream call completed");
        Ok(body.to_vec())
    }
}

/// Decode a raw body, tagging failures with the endpoint name.
pub(crate) fn decode<T: DeserializeOwned>(name: &str, body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|source| FetchError::Decode {
        endpoint: name.to_string(),
        source,
    })
}

fn append_query(url: &mut Url, params: &[(&str, &str)]) {
    if params.is_empty() {
        return;
    }
    url.query_pairs_mut().extend_pairs(params);
}

fn encode_form(params: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}
