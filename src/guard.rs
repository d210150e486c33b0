use axum::{
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{models::Role, session::Session};

pub const LOGIN_PATH: &str = "/login";
/// Where authenticated sessions land when a screen is outside their role.
pub const LANDING_PATH: &str = "/dashboard";

/// Tells the front end whether a redirect replaces the current history entry.
pub const NAVIGATION_HEADER: HeaderName = HeaderName::from_static("x-navigation");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("route pattern '{0}' must start with '/'")]
    InvalidPattern(String),
    #[error("route pattern '{0}' uses '*' before its last segment")]
    MisplacedWildcard(String),
    #[error("route '{0}' is protected but allows no role")]
    EmptyRoleSet(String),
    #[error("route pattern '{0}' is declared twice")]
    DuplicatePattern(String),
    #[error("login path '{0}' must be public")]
    LoginNotPublic(String),
    #[error("landing path '{path}' does not render for role {role}")]
    LandingUnreachable { path: String, role: Role },
}

// --- Path Patterns ---

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Rest,
}

/// RoutePattern
///
/// A `/`-separated path pattern. `:name` matches any single segment and a trailing `*`
/// matches whatever remains (including nothing). Trailing slashes are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        if !raw.starts_with('/') {
            return Err(PolicyError::InvalidPattern(raw.to_string()));
        }
        let parts: Vec<&str> = split_path(raw).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let segment = match *part {
                "*" if index + 1 == parts.len() => Segment::Rest,
                "*" => return Err(PolicyError::MisplacedWildcard(raw.to_string())),
                param if param.starts_with(':') => Segment::Param,
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Param => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(expected) => match parts.next() {
                    Some(part) if part == expected => {}
                    _ => return false,
                },
            }
        }
        parts.next().is_none()
    }
}

/// Strips query and fragment, then yields the non-empty segments.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|segment| !segment.is_empty())
}

// --- Policy Table ---

/// Access
///
/// Who may render a route: anybody, or sessions holding one of the listed roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(Vec<Role>),
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub pattern: RoutePattern,
    pub access: Access,
}

impl RoutePolicy {
    pub fn public(pattern: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            access: Access::Public,
        })
    }

    pub fn roles(pattern: &str, roles: &[Role]) -> Result<Self, PolicyError> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            access: Access::Roles(roles.to_vec()),
        })
    }
}

// --- Navigation ---

/// NavigationRequest
///
/// A request to render `path`. `public` is the per-route override that renders the
/// screen without consulting the session at all.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct NavigationRequest {
    pub path: String,
    #[serde(default)]
    pub public: bool,
}

impl NavigationRequest {
    pub fn to(path: &str) -> Self {
        Self {
            path: path.to_string(),
            public: false,
        }
    }
}

/// Decision
///
/// The guard's verdict for one navigation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    Render,
    Redirect { to: String, replace: bool },
}

impl Decision {
    fn redirect(to: &str) -> Self {
        Decision::Redirect {
            to: to.to_string(),
            replace: true,
        }
    }
}

/// Builds the HTTP form of a navigation: `303 See Other` plus the history hint.
pub fn redirect_response(to: &str, replace: bool) -> Response {
    let location = HeaderValue::from_str(to).unwrap_or_else(|_| HeaderValue::from_static("/"));
    let mode = HeaderValue::from_static(if replace { "replace" } else { "push" });
    let mut response = StatusCode::SEE_OTHER.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    response.headers_mut().insert(NAVIGATION_HEADER, mode);
    response
}

/// RouteGuard
///
/// Decides, for every navigation, whether the current session may render the requested
/// screen. The table is static and validated once at start; evaluation is a pure
/// function of the request and the session and never touches session state.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    policies: Vec<RoutePolicy>,
    login_path: String,
    landing_path: String,
}

/// GuardState
///
/// The shared, immutable guard injected into the router.
pub type GuardState = Arc<RouteGuard>;

impl RouteGuard {
    pub fn new(
        policies: Vec<RoutePolicy>,
        login_path: &str,
        landing_path: &str,
    ) -> Result<Self, PolicyError> {
        let mut seen = HashSet::new();
        for policy in &policies {
            if !seen.insert(policy.pattern.as_str().to_string()) {
                return Err(PolicyError::DuplicatePattern(policy.pattern.as_str().to_string()));
            }
            if let Access::Roles(roles) = &policy.access {
                if roles.is_empty() {
                    return Err(PolicyError::EmptyRoleSet(policy.pattern.as_str().to_string()));
                }
            }
        }

        let guard = Self {
            policies,
            login_path: login_path.to_string(),
            landing_path: landing_path.to_string(),
        };

        if !guard.is_public(login_path) {
            return Err(PolicyError::LoginNotPublic(login_path.to_string()));
        }
        // A landing page outside some role's reach would bounce that role forever.
        for role in Role::ALL {
            if !guard.permits(role, landing_path) {
                return Err(PolicyError::LandingUnreachable {
                    path: landing_path.to_string(),
                    role,
                });
            }
        }

        Ok(guard)
    }

    /// The gym console's route table.
    pub fn standard() -> Result<Self, PolicyError> {
        use Role::*;

        let front_desk = [Receptionist, Administrator];
        let policies = vec![
            RoutePolicy::public("/")?,
            RoutePolicy::public(LOGIN_PATH)?,
            RoutePolicy::public("/ayuda")?,
            RoutePolicy::roles(LANDING_PATH, &Role::ALL)?,
            RoutePolicy::roles("/clientes/*", &front_desk)?,
            RoutePolicy::roles("/membresias/*", &front_desk)?,
            RoutePolicy::roles("/pagos/*", &front_desk)?,
            RoutePolicy::roles("/productos/*", &front_desk)?,
            RoutePolicy::roles("/clases/:id/inscripciones", &front_desk)?,
            RoutePolicy::roles("/clases/*", &[Receptionist, Trainer])?,
            RoutePolicy::roles("/rutinas/*", &[Trainer])?,
            RoutePolicy::roles("/consultas/*", &[Receptionist, Trainer])?,
            RoutePolicy::roles("/entrenadores/*", &[Administrator])?,
            RoutePolicy::roles("/contabilidad/*", &[Administrator])?,
            RoutePolicy::roles("/usuarios/*", &[Administrator])?,
        ];
        Self::new(policies, LOGIN_PATH, LANDING_PATH)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// First matching entry in declared order.
    pub fn policy_for(&self, path: &str) -> Option<&RoutePolicy> {
        self.policies.iter().find(|policy| policy.pattern.matches(path))
    }

    pub fn is_public(&self, path: &str) -> bool {
        matches!(
            self.policy_for(path).map(|policy| &policy.access),
            Some(Access::Public)
        )
    }

    /// Whether an authenticated session with `role` renders `path`.
    pub fn permits(&self, role: Role, path: &str) -> bool {
        match self.policy_for(path).map(|policy| &policy.access) {
            Some(Access::Roles(roles)) => role.is_privileged() || roles.contains(&role),
            Some(Access::Public) | None => true,
        }
    }

    pub fn evaluate(&self, request: &NavigationRequest, session: Option<&Session>) -> Decision {
        if request.public || self.is_public(&request.path) {
            return Decision::Render;
        }

        let Some(session) = session else {
            tracing::debug!(path = %request.path, "no session, redirecting to login");
            return Decision::redirect(&self.login_path);
        };

        if !self.permits(session.role(), &request.path) {
            tracing::debug!(
                path = %request.path,
                role = %session.role(),
                "role not allowed, redirecting to landing page"
            );
            return Decision::redirect(&self.landing_path);
        }

        Decision::Render
    }
}
