use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;

use crate::{
    error::ApiError,
    models::Role,
    session::{Session, SessionState},
};

/// CurrentSession Extractor
///
/// Resolves whatever session the console currently holds, possibly none. Used by the
/// public screens, which render for everybody but still tailor the menu to the role.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn role(&self) -> Option<Role> {
        self.0.as_ref().map(Session::role)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionState::from_ref(state);
        Ok(CurrentSession(store.current().await))
    }
}

/// AuthenticatedSession Extractor
///
/// The session of a guarded screen. The navigation guard has already redirected
/// anonymous visitors, so a rejection here only happens when the session was cleared
/// between the guard and the handler; it redirects to login all the same.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub Session);

impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionState::from_ref(state);
        store
            .current()
            .await
            .map(AuthenticatedSession)
            .ok_or(ApiError::NoSession)
    }
}
