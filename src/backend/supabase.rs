//! Hosted backend adapter speaking the Supabase REST dialect.
//!
//! Auth goes to `/auth/v1`, rows to `/rest/v1` (PostgREST) and blobs to
//! `/storage/v1`. The session is kept in memory only; auth notifications are
//! delivered through the same channel the mock uses.

use crate::backend::auth_events::{AuthEvent, AuthEvents, Subscription};
use crate::backend::query::{
    DataApi, InsertBuilder, Query, QueryBuilder, QueryKind, QueryResponse,
};
use crate::backend::storage::{StorageApi, UploadResponse};
use crate::backend::{AuthApi, BackendClient, BackendMode};
use crate::config::{AppSettings, BackendConfig};
use crate::entities::{AuthUser, Blob, Row, Session, SignUpOptions, UserMetadata};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<Session>>,
    events: AuthEvents,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: UserMetadata,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

impl SupabaseBackend {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig, settings: &AppSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.key.clone(),
            session: Mutex::new(None),
            events: AuthEvents::new(),
        })
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Bearer token for data and storage calls: the user's when signed in,
    /// the anonymous key otherwise.
    fn bearer(&self) -> String {
        self.current_session()
            .map_or_else(|| self.api_key.clone(), |session| session.access_token)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        with_auth_headers(request, &self.api_key, &self.bearer())
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            encode_path(path)
        )
    }

    fn start_session(&self, session: Session) -> Session {
        self.set_session(Some(session.clone()));
        self.events.emit(AuthEvent::SignedIn, Some(&session));
        session
    }
}

fn with_auth_headers(request: RequestBuilder, api_key: &str, bearer: &str) -> RequestBuilder {
    request
        .header("apikey", api_key)
        .header("Authorization", format!("Bearer {bearer}"))
}

/// Percent-encodes each path segment, keeping the separators.
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// PostgREST query-string parameters for `query`.
#[must_use]
pub fn rest_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if query.kind == QueryKind::Select {
        params.push(("select".to_string(), "*".to_string()));
    }
    for filter in &query.filters {
        let operand = match &filter.value {
            Value::Null => "is.null".to_string(),
            Value::String(text) => format!("eq.{text}"),
            other => format!("eq.{other}"),
        };
        params.push((filter.column.clone(), operand));
    }
    if query.kind == QueryKind::Select && !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| {
                format!(
                    "{}.{}",
                    o.column,
                    if o.ascending { "asc" } else { "desc" }
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    params
}

/// Pulls a human-readable message out of an error body.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(Error::Backend {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn insert_rows(
    client: Client,
    url: String,
    api_key: String,
    bearer: String,
    row: Row,
) -> Result<Vec<Row>> {
    let request = client
        .post(url)
        .header("Prefer", "return=representation")
        .json(&[row]);
    let response = check(with_auth_headers(request, &api_key, &bearer).send().await?).await?;
    Ok(response.json::<Vec<Row>>().await?)
}

#[async_trait]
impl AuthApi for SupabaseBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.current_session())
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let token: TokenResponse = check(response).await?.json().await?;
        info!("Signed in as {}", token.user.id);
        Ok(self.start_session(Session {
            access_token: token.access_token,
            user: token.user,
        }))
    }

    #[instrument(skip(self, password, options))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: SignUpOptions,
    ) -> Result<Option<Session>> {
        let response = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&SignUpRequest {
                email,
                password,
                data: options.into(),
            })
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;

        // Without auto-confirm the service answers with the bare user object.
        if body.get("access_token").is_none() {
            info!("Sign-up for {} awaiting email confirmation", email);
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(Some(self.start_session(Session {
            access_token: token.access_token,
            user: token.user,
        })))
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.current_session() {
            let result = self
                .client
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", &self.api_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await;
            match result {
                Ok(response) => {
                    if let Err(e) = check(response).await {
                        warn!("Remote logout failed, clearing local session anyway: {}", e);
                    }
                }
                Err(e) => warn!("Remote logout failed, clearing local session anyway: {}", e),
            }
        }
        self.set_session(None);
        self.events.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>,
    ) -> Subscription {
        let current = self.current_session();
        self.events.subscribe(listener, current.as_ref())
    }
}

#[async_trait]
impl DataApi for SupabaseBackend {
    fn from(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, table)
    }

    fn insert(&self, table: &str, row: Row) -> InsertBuilder {
        debug!("Inserting into '{}'", table);
        InsertBuilder::spawned(tokio::spawn(insert_rows(
            self.client.clone(),
            self.rest_url(table),
            self.api_key.clone(),
            self.bearer(),
            row,
        )))
    }

    #[instrument(skip(self, query), fields(table = %query.table, kind = ?query.kind))]
    async fn execute(&self, query: Query) -> Result<QueryResponse> {
        let params = rest_params(&query);
        let url = self.rest_url(&query.table);
        match query.kind {
            QueryKind::Select => {
                let request = self.authorized(self.client.get(url).query(&params));
                let data: Vec<Row> = check(request.send().await?).await?.json().await?;
                debug!("Select returned {} rows", data.len());
                Ok(QueryResponse { data, count: None })
            }
            QueryKind::Delete => {
                if query.filters.is_empty() {
                    return Err(Error::Validation {
                        message: "DELETE requires at least one filter".to_string(),
                    });
                }
                let request = self.authorized(
                    self.client
                        .delete(url)
                        .query(&params)
                        .header("Prefer", "return=representation"),
                );
                let removed: Vec<Row> = check(request.send().await?).await?.json().await?;
                debug!("Delete removed {} rows", removed.len());
                Ok(QueryResponse {
                    data: Vec::new(),
                    count: Some(removed.len()),
                })
            }
        }
    }
}

#[async_trait]
impl StorageApi for SupabaseBackend {
    #[instrument(skip(self, blob), fields(size = blob.len()))]
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<UploadResponse> {
        let request = self.authorized(
            self.client
                .post(self.object_url(bucket, path))
                .header("Content-Type", blob.content_type.clone())
                .header("x-upsert", "true")
                .body(blob.bytes),
        );
        check(request.send().await?).await?;
        Ok(UploadResponse {
            path: path.to_string(),
        })
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            encode_path(path)
        )
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<Vec<String>> {
        let request = self.authorized(
            self.client
                .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
                .json(&RemoveRequest { prefixes: paths }),
        );
        let removed: Vec<Value> = check(request.send().await?).await?.json().await?;
        Ok(removed
            .iter()
            .filter_map(|object| object.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

impl BackendClient for SupabaseBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }
}
