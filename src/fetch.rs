use std::time::Duration;

use tracing::debug;

use crate::error::{FetchError, PreconditionError};
use crate::query::QueryParameters;

pub const ENDPOINT: &str =
    "https://www.work24.go.kr/cm/openApi/call/hr/callOpenApiSvcInfo311L01.do";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can hand back the raw body of one result page.
pub trait PageSource {
    fn fetch_page(&self, params: &QueryParameters) -> Result<Vec<u8>, FetchError>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch_page(&self, params: &QueryParameters) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_page(params)
    }
}

/// Blocking HTTP source for the live training API.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    auth_key: String,
}

impl HttpPageSource {
    pub fn new(auth_key: impl Into<String>) -> Result<Self, PreconditionError> {
        Self::with_endpoint(auth_key, ENDPOINT)
    }

    pub fn with_endpoint(
        auth_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, PreconditionError> {
        let auth_key = auth_key.into();
        if auth_key.trim().is_empty() {
            return Err(PreconditionError::MissingCredential);
        }
        Ok(Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
            auth_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, params: &QueryParameters) -> Result<Vec<u8>, FetchError> {
        let page = params.page_number;
        let transport = |err: reqwest::Error| FetchError::Transport {
            page,
            reason: err.to_string(),
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params.to_pairs(&self.auth_key))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(transport)?;
        debug!(page, bytes = body.len(), "fetched page");
        Ok(body.to_vec())
    }
}
