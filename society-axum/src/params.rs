use std::collections::HashMap;

use axum::extract::{FromRequestParts, OriginalUri, Query};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri};
use society_core::errors::SocietyError;

use crate::SocietyAxumError;

/// What a REST request contributes to a service call.
#[derive(Debug, Clone, Default)]
pub struct RestParams {
    pub provider: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
    pub raw_query: Option<String>,
}

impl RestParams {
    pub fn from_parts(
        provider: &str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        method: &str,
        uri: &Uri,
    ) -> Self {
        let mut out = Self {
            provider: provider.to_string(),
            headers: HashMap::new(),
            query,
            method: method.to_string(),
            path: uri.path().to_string(),
            raw_query: uri.query().map(|s| s.to_string()),
        };

        for (k, v) in headers.iter() {
            if let Ok(s) = v.to_str() {
                out.headers.insert(k.to_string(), s.to_string());
            }
        }

        out
    }

    /// A non-empty, trimmed query value.
    pub fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// `?key=<usize>`; anything else is a `400`.
    pub fn query_usize(&self, key: &str) -> anyhow::Result<Option<usize>> {
        match self.query_str(key) {
            None => Ok(None),
            Some(v) => v.parse::<usize>().map(Some).map_err(|_| {
                SocietyError::bad_request(format!("Query parameter '{key}' must be a non-negative integer"))
                    .into_anyhow()
            }),
        }
    }
}

pub trait FromRestParams: Sized {
    fn from_rest_params(params: RestParams) -> Self;
}

impl FromRestParams for RestParams {
    fn from_rest_params(params: RestParams) -> Self {
        params
    }
}

impl FromRestParams for () {
    fn from_rest_params(_params: RestParams) -> Self {}
}

#[cfg(feature = "auth")]
impl FromRestParams for society_auth::AuthParams<RestParams> {
    fn from_rest_params(params: RestParams) -> Self {
        society_auth::AuthParams {
            provider: Some(params.provider.clone()),
            headers: params.headers.clone(),
            authenticated: false,
            claims: None,
            inner: params,
        }
    }
}

/// Extractor for a service's params type, built from the request's headers,
/// query string, method and original URI.
pub struct Rest<P>(pub P);

impl<S, P> FromRequestParts<S> for Rest<P>
where
    S: Send + Sync,
    P: FromRestParams + Send,
{
    type Rejection = SocietyAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(u)| u.clone())
            .unwrap_or_else(|| parts.uri.clone());

        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&uri).map_err(|e| {
            SocietyAxumError::from(SocietyError::bad_request(format!("Invalid query string: {e}")))
        })?;

        let params = RestParams::from_parts("rest", &parts.headers, query, parts.method.as_str(), &uri);
        Ok(Rest(P::from_rest_params(params)))
    }
}
