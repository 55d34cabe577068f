//! Leagues domain state shared across handlers

use std::sync::Arc;

use kudos_email::EmailService;

use crate::engine::join::JoinEngine;
use crate::engine::notify::NotificationEngine;
use crate::engine::switch::SwitchEngine;
use crate::store::MembershipStore;

/// Application state for the leagues domain
#[derive(Clone)]
pub struct LeaguesState {
    pub store: Arc<dyn MembershipStore>,
    pub email: Arc<dyn EmailService>,
}

impl LeaguesState {
    pub fn new(store: Arc<dyn MembershipStore>, email: Arc<dyn EmailService>) -> Self {
        Self { store, email }
    }

    pub fn join_engine(&self) -> JoinEngine {
        JoinEngine::new(self.store.clone())
    }

    pub fn switch_engine(&self) -> SwitchEngine {
        SwitchEngine::new(self.store.clone())
    }

    pub fn notification_engine(&self) -> NotificationEngine {
        NotificationEngine::new(self.store.clone(), self.email.clone())
    }
}
