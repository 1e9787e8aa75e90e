//! One-shot flash messages stored in the session.
//!
//! Handlers queue messages before redirecting; the next page rendered drains
//! them through [`PageContext`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// Session failures are logged and otherwise ignored; a lost flash message
/// never fails the request.
pub async fn push_flash(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut queued: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    queued.push(FlashMessage {
        level,
        text: text.into(),
    });

    if let Err(e) = session.insert(session_keys::FLASH, queued).await {
        tracing::warn!(error = %e, "failed to queue flash message");
    }
}

/// Remove and return every queued message.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(session_keys::FLASH).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read flash messages");
            Vec::new()
        }
    }
}

/// What every page layout needs: the logged-in user and pending messages.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flash: Vec<FlashMessage>,
}

impl PageContext {
    /// Read the user and drain pending messages.
    pub async fn from_session(session: &Session) -> Self {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flash = take_flash(session).await;
        Self { user, flash }
    }

    #[must_use]
    pub fn is_vendor(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_vendor())
    }

    #[must_use]
    pub fn is_buyer(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_buyer())
    }

    /// Add a message to this render only.
    pub fn flash_now(&mut self, level: FlashLevel, text: impl Into<String>) {
        self.flash.push(FlashMessage {
            level,
            text: text.into(),
        });
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(Self::from_session(session).await),
            None => Ok(Self::default()),
        }
    }
}
