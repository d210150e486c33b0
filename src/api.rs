use async_trait::async_trait;
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::{
    error::ApiError,
    models::{
        AccountingEntry, Client, ClientOverview, Credentials, EnrollRequest, Enrollment, GymClass,
        LoginResponse, Membership, Payment, Product, Routine, Trainer, UserAccount, Validate,
    },
    roster::{ClassRoster, RosterError, RosterView},
    session::{Session, SessionState},
};

// --- Backend Collections ---

/// Resource
///
/// A record type the backend exposes as a REST collection at `PATH`. `SCREEN` names the
/// console screen that lists it.
pub trait Resource: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {
    const PATH: &'static str;
    const SCREEN: &'static str;
}

macro_rules! resource {
    ($ty:ty, $path:literal, $screen:literal) => {
        impl Resource for $ty {
            const PATH: &'static str = $path;
            const SCREEN: &'static str = $screen;
        }
    };
}

resource!(Client, "/clientes", "clientes");
resource!(Trainer, "/entrenadores", "entrenadores");
resource!(Membership, "/membresias", "membresias");
resource!(Product, "/productos", "productos");
resource!(Payment, "/pagos", "pagos");
resource!(AccountingEntry, "/contabilidad", "contabilidad");
resource!(GymClass, "/clases", "clases");
resource!(Routine, "/rutinas", "rutinas");
resource!(UserAccount, "/usuarios", "usuarios");

// 1. Transport Contract
/// BackendRequest
///
/// One call to the backend, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

/// Transport
///
/// Moves a request to the backend and brings back the raw status and body. Only failures
/// where no response arrived at all are errors at this level; status interpretation
/// belongs to [`ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: BackendRequest) -> Result<BackendResponse, ApiError>;
}

pub type TransportState = Arc<dyn Transport>;

// 2. The Real Implementation (reqwest)
/// HttpTransport
///
/// Talks JSON over HTTP(S) to the gym backend.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: BackendRequest) -> Result<BackendResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, %url, error = %e, "backend unreachable");
            ApiError::Connectivity(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        tracing::debug!(method = %request.method, %url, status, "backend responded");
        Ok(BackendResponse { status, body })
    }
}

// 3. The Mock Implementation (For Tests)
#[derive(Clone)]
enum MockReply {
    Respond {
        status: u16,
        body: String,
        delay: Option<Duration>,
    },
    Unreachable,
}

/// MockTransport
///
/// Canned backend responses keyed by method and path, with every request recorded so
/// tests can assert on what was (or was not) sent. Unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    replies: HashMap<(String, String), MockReply>,
    calls: Mutex<Vec<BackendRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.replies.insert(
            (method.to_string(), path.to_string()),
            MockReply::Respond {
                status,
                body: body.to_string(),
                delay: None,
            },
        );
        self
    }

    pub fn with_delayed_response(
        mut self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) -> Self {
        self.replies.insert(
            (method.to_string(), path.to_string()),
            MockReply::Respond {
                status,
                body: body.to_string(),
                delay: Some(delay),
            },
        );
        self
    }

    pub fn with_unreachable(mut self, method: Method, path: &str) -> Self {
        self.replies
            .insert((method.to_string(), path.to_string()), MockReply::Unreachable);
        self
    }

    pub async fn calls(&self) -> Vec<BackendRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: BackendRequest) -> Result<BackendResponse, ApiError> {
        let key = (request.method.to_string(), request.path.clone());
        self.calls.lock().await.push(request);

        match self.replies.get(&key).cloned() {
            Some(MockReply::Respond {
                status,
                body,
                delay,
            }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(BackendResponse { status, body })
            }
            Some(MockReply::Unreachable) => Err(ApiError::Connectivity(
                "mock transport: connection refused".to_string(),
            )),
            None => Ok(BackendResponse {
                status: 404,
                body: r#"{"message":"no mock route"}"#.to_string(),
            }),
        }
    }
}

// --- Client ---

/// Pulls a human readable message out of a backend error body.
fn backend_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string);
    }
    Some(trimmed.chars().take(200).collect())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// ApiClient
///
/// The console's only way to reach the backend. Attaches the session's bearer token,
/// classifies failures (401 clears the session, 403 keeps it) and drops responses that
/// arrive after the session changed.
#[derive(Clone)]
pub struct ApiClient {
    transport: TransportState,
    session: SessionState,
}

impl ApiClient {
    pub fn new(transport: TransportState, session: SessionState) -> Self {
        Self { transport, session }
    }

    /// Exchanges credentials for a token and starts a session. A 401/403 here means bad
    /// credentials, not an expired session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        credentials.validate()?;

        let response = self
            .transport
            .execute(BackendRequest {
                method: Method::POST,
                path: "/auth/login".to_string(),
                bearer: None,
                body: Some(to_body(credentials)?),
            })
            .await?;

        match response.status {
            200..=299 => {
                let login: LoginResponse = decode(&response.body)?;
                if login.token.trim().is_empty() {
                    return Err(ApiError::Decode("login response carries an empty token".to_string()));
                }
                let role = login.resolved_role();
                Ok(self.session.login(login.token, role).await?)
            }
            401 | 403 => {
                tracing::info!(username = %credentials.username, "login rejected");
                Err(ApiError::InvalidCredentials)
            }
            status => Err(ApiError::Failed {
                status,
                message: backend_message(&response.body)
                    .unwrap_or_else(|| "login failed".to_string()),
            }),
        }
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        Ok(self.session.logout().await?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        // Epoch first: a session swapped in between these two reads makes the result stale.
        let epoch = self.session.epoch();
        let session = self.session.current().await.ok_or(ApiError::NoSession)?;

        let response = self
            .transport
            .execute(BackendRequest {
                method,
                path,
                bearer: Some(session.token().to_string()),
                body,
            })
            .await?;

        if response.status == 401 {
            if self.session.expire(epoch).await? || self.session.current().await.is_none() {
                return Err(ApiError::Unauthorized);
            }
            // Rejected credential belonged to a session that has since been replaced.
            return Err(ApiError::Stale);
        }
        if self.session.epoch() != epoch {
            tracing::debug!("dropping response issued under a previous session");
            return Err(ApiError::Stale);
        }

        match response.status {
            200..=299 => decode(&response.body),
            403 => Err(ApiError::Forbidden {
                message: backend_message(&response.body)
                    .unwrap_or_else(|| "permission denied".to_string()),
            }),
            404 => Err(ApiError::NotFound {
                message: backend_message(&response.body)
                    .unwrap_or_else(|| "resource not found".to_string()),
            }),
            status => Err(ApiError::Failed {
                status,
                message: backend_message(&response.body)
                    .unwrap_or_else(|| "unexpected error".to_string()),
            }),
        }
    }

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        self.send(Method::GET, R::PATH.to_string(), None).await
    }

    pub async fn fetch<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        self.send(Method::GET, format!("{}/{id}", R::PATH), None)
            .await
    }

    /// Validation runs locally first; an invalid record never reaches the backend.
    pub async fn create<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        record.validate()?;
        self.send(Method::POST, R::PATH.to_string(), Some(to_body(record)?))
            .await
    }

    pub async fn update<R: Resource>(&self, id: i64, record: &R) -> Result<R, ApiError> {
        record.validate()?;
        self.send(Method::PUT, format!("{}/{id}", R::PATH), Some(to_body(record)?))
            .await
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        self.send::<Value>(Method::DELETE, format!("{}/{id}", R::PATH), None)
            .await
            .map(|_| ())
    }

    pub async fn enrollments(&self, class_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.send(Method::GET, enrollment_path(class_id), None)
            .await
    }

    pub async fn roster(&self, class_id: i64) -> Result<ClassRoster, ApiError> {
        let (class, enrollments) =
            tokio::try_join!(self.fetch::<GymClass>(class_id), self.enrollments(class_id))?;
        Ok(ClassRoster::new(class, enrollments))
    }

    /// Class, enrollments and clients are fetched concurrently.
    pub async fn roster_view(&self, class_id: i64) -> Result<RosterView, ApiError> {
        let (class, enrollments, clients) = tokio::try_join!(
            self.fetch::<GymClass>(class_id),
            self.enrollments(class_id),
            self.list::<Client>()
        )?;
        Ok(RosterView::new(
            ClassRoster::new(class, enrollments),
            &clients,
        ))
    }

    /// Checks capacity, duplicates and client status against the current roster before
    /// asking the backend to register the client.
    pub async fn enroll(&self, class_id: i64, request: &EnrollRequest) -> Result<Enrollment, ApiError> {
        request.validate()?;
        let (roster, client) = tokio::try_join!(
            self.roster(class_id),
            self.fetch::<Client>(request.client_id)
        )?;
        if !client.active {
            return Err(RosterError::InactiveClient {
                client_id: request.client_id,
            }
            .into());
        }
        roster.check_enrollment(request.client_id)?;

        tracing::info!(class_id, client_id = request.client_id, "enrolling client");
        self.send(Method::POST, enrollment_path(class_id), Some(to_body(request)?))
            .await
    }

    /// Client, routines and payments are fetched concurrently; any arrival order works.
    pub async fn client_overview(&self, client_id: i64) -> Result<ClientOverview, ApiError> {
        let (client, routines, payments) = tokio::try_join!(
            self.fetch::<Client>(client_id),
            self.list::<Routine>(),
            self.list::<Payment>()
        )?;

        let routine = client
            .routine_id
            .and_then(|id| routines.into_iter().find(|r| r.id == Some(id)));
        let mut payments: Vec<Payment> = payments
            .into_iter()
            .filter(|p| p.client_id == client_id)
            .collect();
        payments.sort_by(|a, b| b.paid_on.cmp(&a.paid_on));
        let total_paid = payments.iter().map(|p| p.amount).sum();

        Ok(ClientOverview {
            client,
            routine,
            payments,
            total_paid,
        })
    }
}

fn enrollment_path(class_id: i64) -> String {
    format!("{}/{class_id}/inscripciones", GymClass::PATH)
}
