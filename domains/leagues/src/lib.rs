//! Leagues domain: leagues, panels, teams, companies, notifications
//!
//! The membership and matching engine of the Kudos backend. Users join
//! leagues individually or through panels and capacity-bounded teams;
//! invitations travel as notifications that are confirmed or rejected by
//! their recipient.

pub mod api;
pub mod domain;
pub mod engine;
pub mod store;

// Re-export domain types at the crate root for convenience
pub use domain::eligibility;
pub use domain::entities::*;
pub use domain::state::{
    NotificationEvent, NotificationState, NotificationStateMachine, StateError,
};

// Re-export store types
pub use store::{MembershipStore, MemoryStore, PostgresStore};

// Re-export engines
pub use engine::allocator;
pub use engine::join::JoinEngine;
pub use engine::notify::NotificationEngine;
pub use engine::switch::{SwitchEngine, SwitchTarget};

// Re-export API types
pub use api::routes;
pub use api::LeaguesState;
