//! State machine for notification redemption
//!
//! A notification is pending until its recipient acts on it; confirming or
//! rejecting both land in the single terminal state, redeemed. Withdrawal
//! (`deleted`) is an orthogonal flag modeled as a guard: a withdrawn
//! notification can no longer be redeemed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} to {to} via {event}")]
    InvalidTransition {
        from: String,
        to: String,
        event: String,
    },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

/// Notification states. Derived from `redeemedAt`, not stored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Pending,
    Redeemed,
}

impl NotificationState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redeemed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [NotificationState] {
        match self {
            Self::Pending => &[Self::Redeemed],
            Self::Redeemed => &[],
        }
    }
}

impl std::fmt::Display for NotificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Redeemed => write!(f, "redeemed"),
        }
    }
}

/// Events that trigger notification state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationEvent {
    /// Recipient accepts the invitation (or acknowledges the message)
    Confirm,
    /// Recipient declines the invitation
    Reject,
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirm => write!(f, "confirm"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Guard context for notification transitions
#[derive(Debug, Clone)]
pub struct NotificationGuardContext {
    /// Whether the notification has been withdrawn (`deleted = true`)
    pub is_withdrawn: bool,
}

/// Notification state machine
pub struct NotificationStateMachine;

impl NotificationStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: NotificationState,
        event: NotificationEvent,
        context: Option<&NotificationGuardContext>,
    ) -> Result<NotificationState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (&current, &event) {
            (NotificationState::Pending, NotificationEvent::Confirm)
            | (NotificationState::Pending, NotificationEvent::Reject) => {
                if let Some(ctx) = context {
                    if ctx.is_withdrawn {
                        return Err(StateError::GuardFailed(
                            "Cannot act on a withdrawn notification".to_string(),
                        ));
                    }
                }
                Ok(NotificationState::Redeemed)
            }

            // Invalid transitions
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                to: "unknown".to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(
        current: NotificationState,
        event: &NotificationEvent,
        context: Option<&NotificationGuardContext>,
    ) -> bool {
        Self::transition(current, *event, context).is_ok()
    }
}
