//! Authentication readiness

use serde::Serialize;

/// Whether a valid authorization header can be produced without user
/// interaction.
///
/// Starts [`Readiness::Unknown`] until the startup probe or an explicit
/// store/clear resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl Readiness {
    /// Readiness for a boolean outcome.
    pub fn from_ready(ready: bool) -> Self {
        if ready {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }

    /// `None` while unknown.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Authenticated => Some(true),
            Self::Unauthenticated => Some(false),
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Self::Unknown
    }
}
