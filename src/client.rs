//! HTTP clients for the remote finance API.
//!
//! Provides both async and blocking client variants behind feature flags.
//! Each implements the matching backend trait, so it can be handed to the
//! ledger in place of a local backend.

use core::time::Duration;

use url::Url;

use crate::error::{LedgerError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transactions collection path segment.
const TRANSACTIONS: &str = "transactions";

/// Budgets collection path segment.
const BUDGETS: &str = "budgets";

/// Server-side spending recompute path segment, below [`BUDGETS`].
const REFRESH_SPENDING: &str = "refresh-spending";

/// Generates an API client (async or blocking) with builder, backend
/// implementation and builder tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        backend_trait: $backend_trait:ident,
        http_type: $http_type:ty,
        request_type: $req_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Bearer token for API authentication.
            token: Option<SecretString>,
            /// API base URL.
            base_url: Option<String>,
            /// Per-request timeout.
            timeout: Duration,
        }

        impl $builder {
            /// Sets the bearer token for API authentication.
            #[inline]
            #[must_use]
            pub fn token<T: Into<String>>(mut self, token: T) -> Self {
                self.token = Some(SecretString::from(token.into()));
                self
            }

            /// Sets the API base URL, e.g. `https://api.example.com/v1`.
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Overrides the per-request timeout (default 5 seconds).
            #[inline]
            #[must_use]
            pub const fn timeout(mut self, timeout: Duration) -> Self {
                self.timeout = timeout;
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Config`] if the token or base URL is
            /// missing or the URL is malformed.
            /// Returns [`LedgerError::Network`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let token = self
                    .token
                    .ok_or_else(|| LedgerError::Config("API token is required".to_owned()))?;
                let raw = self
                    .base_url
                    .ok_or_else(|| LedgerError::Config("API base URL is required".to_owned()))?;
                let base_url = parse_base_url(&raw)?;
                tracing::debug!(base_url = %base_url, timeout = ?self.timeout, "building client");
                let http = <$http_type>::builder().timeout(self.timeout).build()?;

                Ok($client {
                    http,
                    token,
                    base_url,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Bearer access token.
            token: SecretString,
            /// API base URL.
            base_url: Url,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    token: None,
                    base_url: None,
                    timeout: DEFAULT_TIMEOUT,
                }
            }

            /// Base URL every request is resolved against.
            #[inline]
            #[must_use]
            pub const fn base_url(&self) -> &Url {
                &self.base_url
            }

            /// Resolves `segments` below the base URL.
            fn endpoint(&self, segments: &[&str]) -> Result<Url> {
                let mut url = self.base_url.clone();
                {
                    let mut path = url.path_segments_mut().map_err(|()| {
                        LedgerError::Config(format!("{} cannot be a base URL", self.base_url))
                    })?;
                    let _path = path.pop_if_empty().extend(segments);
                }
                Ok(url)
            }

            /// Authenticates and sends `request`, mapping failure statuses.
            ///
            /// `target` names the resource in [`LedgerError::NotFound`].
            #[tracing::instrument(skip_all, fields(target = %target))]
            $($async_kw)? fn execute(&self, request: $req_type, target: &str) -> Result<$resp_type> {
                let response = request
                    .bearer_auth(self.token.expose_secret())
                    .send()
                    $( .$await_ext )?
                    ?;
                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    return Ok(response);
                }
                let message = response
                    .text()
                    $( .$await_ext )?
                    .unwrap_or_else(|err| format!("unreadable error body: {err}"));
                tracing::debug!(status = status.as_u16(), message = %message, "API error");
                Err(status_error(status.as_u16(), target, message))
            }

            /// Sends `request` and deserializes the JSON response body.
            $($async_kw)? fn fetch<T: DeserializeOwned>(
                &self,
                request: $req_type,
                target: &str,
            ) -> Result<T> {
                let response = self.execute(request, target) $( .$await_ext )? ?;
                let body = response.text() $( .$await_ext )? ?;
                tracing::trace!(body_len = body.len(), "parsing response body");
                serde_json::from_str(&body).map_err(LedgerError::from)
            }
        }

        impl $backend_trait for $client {
            #[tracing::instrument(skip_all)]
            $($async_kw)? fn list_transactions(
                &self,
                filter: &TransactionFilter,
                cursor: Option<&str>,
            ) -> Result<Page<Transaction>> {
                let mut url = self.endpoint(&[TRANSACTIONS])?;
                {
                    let mut query = url.query_pairs_mut();
                    for (key, value) in filter.query_pairs() {
                        let _query = query.append_pair(key, &value);
                    }
                    if let Some(cursor) = cursor {
                        let _query = query.append_pair("cursor", cursor);
                    }
                }
                if url.query() == Some("") {
                    url.set_query(None);
                }
                tracing::trace!(url = %url, "listing transactions");
                self.fetch(self.http.get(url), TRANSACTIONS) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
                let url = self.endpoint(&[TRANSACTIONS, id.as_inner()])?;
                self.fetch(self.http.get(url), id.as_inner()) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all)]
            $($async_kw)? fn create_transaction(&self, payload: &NewTransaction) -> Result<Transaction> {
                let url = self.endpoint(&[TRANSACTIONS])?;
                self.fetch(self.http.post(url).json(payload), TRANSACTIONS) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn update_transaction(
                &self,
                id: &TransactionId,
                changes: &TransactionChanges,
            ) -> Result<Transaction> {
                let url = self.endpoint(&[TRANSACTIONS, id.as_inner()])?;
                self.fetch(self.http.patch(url).json(changes), id.as_inner()) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn delete_transaction(&self, id: &TransactionId) -> Result<()> {
                let url = self.endpoint(&[TRANSACTIONS, id.as_inner()])?;
                let _response = self.execute(self.http.delete(url), id.as_inner()) $( .$await_ext )? ?;
                Ok(())
            }

            #[tracing::instrument(skip_all)]
            $($async_kw)? fn list_budgets(&self, period: Option<BudgetPeriod>) -> Result<Vec<Budget>> {
                let mut url = self.endpoint(&[BUDGETS])?;
                if let Some(period) = period {
                    let mut query = url.query_pairs_mut();
                    let _query = query.append_pair("period", period.as_str());
                }
                self.fetch(self.http.get(url), BUDGETS) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn budget(&self, id: &BudgetId) -> Result<Budget> {
                let url = self.endpoint(&[BUDGETS, id.as_inner()])?;
                self.fetch(self.http.get(url), id.as_inner()) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all)]
            $($async_kw)? fn create_budget(&self, payload: &NewBudget) -> Result<Budget> {
                let url = self.endpoint(&[BUDGETS])?;
                self.fetch(self.http.post(url).json(payload), BUDGETS) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn update_budget(&self, id: &BudgetId, changes: &BudgetChanges) -> Result<Budget> {
                let url = self.endpoint(&[BUDGETS, id.as_inner()])?;
                self.fetch(self.http.patch(url).json(changes), id.as_inner()) $( .$await_ext )?
            }

            #[tracing::instrument(skip_all, fields(id = %id))]
            $($async_kw)? fn delete_budget(&self, id: &BudgetId) -> Result<()> {
                let url = self.endpoint(&[BUDGETS, id.as_inner()])?;
                let _response = self.execute(self.http.delete(url), id.as_inner()) $( .$await_ext )? ?;
                Ok(())
            }

            #[tracing::instrument(skip_all)]
            $($async_kw)? fn refresh_spending(&self) -> Result<Vec<Budget>> {
                let url = self.endpoint(&[BUDGETS, REFRESH_SPENDING])?;
                self.fetch(self.http.post(url), REFRESH_SPENDING) $( .$await_ext )?
            }
        }

    };
}

/// Validates a configured base URL.
fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|err| LedgerError::Config(format!("invalid base URL '{raw}': {err}")))?;
    if url.cannot_be_a_base() {
        return Err(LedgerError::Config(format!(
            "invalid base URL '{raw}': cannot be a base"
        )));
    }
    Ok(url)
}

/// Maps a non-success HTTP status onto the error taxonomy.
fn status_error(status: u16, target: &str, message: String) -> LedgerError {
    match status {
        401 | 403 => LedgerError::AuthExpired,
        404 => LedgerError::not_found(target),
        _ => LedgerError::Api { status, message },
    }
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client.

    use core::time::Duration;

    use secrecy::{ExposeSecret, SecretString};
    use serde::de::DeserializeOwned;
    use url::Url;

    use super::{BUDGETS, DEFAULT_TIMEOUT, REFRESH_SPENDING, TRANSACTIONS, parse_base_url, status_error};
    use crate::backend::Backend;
    use crate::error::{LedgerError, Result};
    use crate::models::{
        Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page,
        Transaction, TransactionChanges, TransactionFilter, TransactionId,
    };

    define_client! {
        client_name: LedgerClient,
        builder_name: LedgerClientBuilder,
        backend_trait: Backend,
        http_type: reqwest::Client,
        request_type: reqwest::RequestBuilder,
        response_type: reqwest::Response,
        client_doc: "Async client for the remote finance API.\n\nUse [`LedgerClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`LedgerClient`].",
        async_kw: async,
        await_kw: await,
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client.

    use core::time::Duration;

    use secrecy::{ExposeSecret, SecretString};
    use serde::de::DeserializeOwned;
    use url::Url;

    use super::{BUDGETS, DEFAULT_TIMEOUT, REFRESH_SPENDING, TRANSACTIONS, parse_base_url, status_error};
    use crate::backend::BlockingBackend;
    use crate::error::{LedgerError, Result};
    use crate::models::{
        Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page,
        Transaction, TransactionChanges, TransactionFilter, TransactionId,
    };

    define_client! {
        client_name: LedgerBlockingClient,
        builder_name: LedgerBlockingClientBuilder,
        backend_trait: BlockingBackend,
        http_type: reqwest::blocking::Client,
        request_type: reqwest::blocking::RequestBuilder,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the remote finance API.\n\nUse [`LedgerBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`LedgerBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{LedgerClient, LedgerClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{LedgerBlockingClient, LedgerBlockingClientBuilder};


#[cfg(all(test, feature = "blocking"))]
mod blocking_wire_tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::backend::BlockingBackend;
    use crate::models::BudgetId;

    #[tokio::test(flavor = "multi_thread")]
    async fn blocking_client_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/budgets/b-7"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/budgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let uri = server.uri();
        let (listed, deleted) = tokio::task::spawn_blocking(move || {
            let api = LedgerBlockingClient::builder()
                .token("secret-token")
                .base_url(uri)
                .build()
                .unwrap();
            (
                api.list_budgets(None),
                api.delete_budget(&BudgetId::from("b-7")),
            )
        })
        .await
        .unwrap();
        assert!(listed.unwrap().is_empty());
        assert!(deleted.unwrap_err().is_not_found());
    }
}
