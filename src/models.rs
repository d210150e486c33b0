use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ValidationError;

// --- Roles ---

/// Role
///
/// The closed set of roles a console session can hold. Serialized in lowercase English;
/// the backend's Spanish spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Administrator,
    Receptionist,
    Trainer,
    /// Token present, no role record stored.
    Anonymous,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Receptionist,
        Role::Trainer,
        Role::Anonymous,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Receptionist => "receptionist",
            Role::Trainer => "trainer",
            Role::Anonymous => "anonymous",
        }
    }

    /// Administrators satisfy every role set.
    pub fn is_privileged(self) -> bool {
        self == Role::Administrator
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" | "administrador" | "admin" => Ok(Role::Administrator),
            "receptionist" | "recepcionista" => Ok(Role::Receptionist),
            "trainer" | "entrenador" => Ok(Role::Trainer),
            "anonymous" | "anonimo" => Ok(Role::Anonymous),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

// --- Authentication Payloads ---

/// Credentials
///
/// Input payload for the login form (POST /login). Forwarded to the backend's
/// `/auth/login` endpoint and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// The backend's answer to a successful login. Some deployments return the role at the
/// top level, others nest it inside the user record; both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(default, alias = "rol", deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

/// An unrecognised role coming from the backend is treated as no role at all, which the
/// session store turns into `Role::Anonymous`.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

impl LoginResponse {
    pub fn resolved_role(&self) -> Option<Role> {
        self.role
            .or_else(|| self.user.as_ref().and_then(|user| user.role))
    }
}

/// SessionSummary
///
/// What the console exposes about the current session (GET /session). The token itself
/// never leaves the session store.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionSummary {
    pub authenticated: bool,
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub role: Option<Role>,
}

// --- Gym Records (Backend Collections) ---

/// Client
///
/// A gym member as stored by the backend (`/clientes`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    /// National id / document number used at the front desk.
    pub document: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub membership_id: Option<i64>,
    #[serde(default)]
    pub routine_id: Option<i64>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Trainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Membership
///
/// A sellable plan. `duration_days` is how long a paid membership stays valid.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Membership {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub duration_days: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub stock: i32,
}

/// Payment
///
/// A payment recorded at the front desk. Gateway payments are settled by the backend
/// and only show up here once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client_id: i64,
    #[serde(default)]
    pub membership_id: Option<i64>,
    pub amount: f64,
    /// Cash, card, transfer... free text as the backend accepts it.
    pub method: String,
    #[ts(type = "string")]
    pub paid_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EntryKind {
    #[default]
    Income,
    Expense,
}

/// AccountingEntry
///
/// A line in the gym's books (`/contabilidad`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AccountingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub kind: EntryKind,
    pub concept: String,
    pub amount: f64,
    #[ts(type = "string")]
    pub recorded_on: NaiveDate,
}

/// GymClass
///
/// A scheduled group class. `capacity` bounds the roster, see [`crate::roster`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct GymClass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub trainer_id: Option<i64>,
    pub capacity: u32,
    /// Human readable schedule, e.g. "Mon/Wed 18:00".
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Enrollment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub class_id: i64,
    pub client_id: i64,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub enrolled_on: Option<NaiveDate>,
}

/// EnrollRequest
///
/// Input payload for registering a client into a class (POST /clases/{id}/inscripciones).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EnrollRequest {
    pub client_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
}

/// Routine
///
/// A training routine authored by a trainer and assigned to clients via `Client::routine_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Routine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trainer_id: Option<i64>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// UserAccount
///
/// A console login managed by administrators (`/usuarios`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[ts(type = "string")]
    #[schema(value_type = String)]
    pub role: Role,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

// --- Composite Views ---

/// ClientOverview
///
/// Output of the client query screen: the client, its assigned routine and its payments
/// (newest first).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ClientOverview {
    pub client: Client,
    pub routine: Option<Routine>,
    pub payments: Vec<Payment>,
    pub total_paid: f64,
}

// --- Client-side Validation ---

/// Validate
///
/// Form-level checks run before anything is posted to the backend. A failure blocks the
/// submission locally.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    match value.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::new(field, "is not a valid email address")),
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(())
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

impl Validate for Client {
    fn validate(&self) -> Result<(), ValidationError> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        require("document", &self.document)?;
        match &self.email {
            Some(email) if !email.trim().is_empty() => require_email("email", email),
            _ => Ok(()),
        }
    }
}

impl Validate for Trainer {
    fn validate(&self) -> Result<(), ValidationError> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        require_email("email", &self.email)
    }
}

impl Validate for Membership {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require_positive("price", self.price)?;
        if self.duration_days == 0 {
            return Err(ValidationError::new("duration_days", "must be at least one day"));
        }
        Ok(())
    }
}

impl Validate for Product {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require_positive("price", self.price)?;
        if self.stock < 0 {
            return Err(ValidationError::new("stock", "must not be negative"));
        }
        Ok(())
    }
}

impl Validate for Payment {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive("amount", self.amount)?;
        require("method", &self.method)
    }
}

impl Validate for AccountingEntry {
    fn validate(&self) -> Result<(), ValidationError> {
        require("concept", &self.concept)?;
        require_positive("amount", self.amount)
    }
}

impl Validate for GymClass {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("schedule", &self.schedule)?;
        if self.capacity == 0 {
            return Err(ValidationError::new("capacity", "must be at least one"));
        }
        Ok(())
    }
}

impl Validate for Routine {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        for exercise in &self.exercises {
            require("exercises.name", &exercise.name)?;
            if exercise.sets == 0 || exercise.reps == 0 {
                return Err(ValidationError::new(
                    "exercises",
                    "sets and reps must be at least one",
                ));
            }
        }
        Ok(())
    }
}

impl Validate for UserAccount {
    fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)
    }
}

impl Validate for EnrollRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id <= 0 {
            return Err(ValidationError::new("client_id", "must reference a client"));
        }
        Ok(())
    }
}
