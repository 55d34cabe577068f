//! Notification workflow
//!
//! Invites travel as notifications addressed to a user. Creation is an
//! upsert keyed on `(user, group, type)`: re-inviting a user replaces their
//! pending invite instead of duplicating it. Acting on a notification
//! dispatches on the notification kind, matched exhaustively.
//!
//! Notification persistence is the strong guarantee; invitation emails are
//! best-effort and never fail the batch.

use std::sync::Arc;

use uuid::Uuid;

use kudos_common::{Error, Result};
use kudos_email::EmailService;

use crate::domain::entities::{
    GroupRef, Notification, NotificationKind, PanelRef, User,
};
use crate::engine::join::JoinEngine;
use crate::store::MembershipStore;

#[derive(Clone)]
pub struct NotificationEngine {
    store: Arc<dyn MembershipStore>,
    email: Arc<dyn EmailService>,
}

impl NotificationEngine {
    pub fn new(store: Arc<dyn MembershipStore>, email: Arc<dyn EmailService>) -> Self {
        Self { store, email }
    }

    /// Create one pending invite per target user, replacing any live invite
    /// with the same `(user, group, type)` key. Users who opted in receive
    /// an email; a failed send is logged and does not fail the batch.
    ///
    /// Returns the number of notifications persisted.
    pub async fn invite_users(
        &self,
        kind: NotificationKind,
        group: GroupRef,
        user_ids: &[Uuid],
        panels: Option<Vec<PanelRef>>,
        message: Option<String>,
        inviter_name: &str,
    ) -> Result<usize> {
        let mut created = 0;

        for &user_id in user_ids {
            let notification = Notification::invite(
                kind,
                user_id,
                group.clone(),
                panels.clone(),
                message.clone(),
            );
            self.store.upsert_invite(&notification).await?;
            created += 1;

            if kind.is_invite() {
                if let Some(user) = self.store.user(user_id).await? {
                    self.send_invite_email(kind, &group, &user, inviter_name).await;
                }
            }
        }

        Ok(created)
    }

    /// Act on a notification on behalf of `user_id`.
    ///
    /// Only the addressed user may confirm or reject; invite kinds dispatch
    /// to the matching join operation, informational kinds are no-ops. The
    /// caller marks the notification redeemed after this succeeds; on error
    /// the notification stays pending.
    pub async fn handle(
        &self,
        user_id: Uuid,
        notification: &Notification,
        confirm: bool,
        panel_id: Option<Uuid>,
    ) -> Result<()> {
        if notification.user.id != user_id {
            return Err(Error::Forbidden(
                "Notification does not belong to this user".to_string(),
            ));
        }

        let join = JoinEngine::new(self.store.clone());

        match notification.kind {
            NotificationKind::IndLeagueInvite => {
                join.join_individual_league(user_id, notification.group.id, confirm)
                    .await?;
            }
            NotificationKind::GroupLeagueInvite => {
                join.join_group_league(user_id, notification.group.id, panel_id, confirm)
                    .await?;
            }
            NotificationKind::CompanyInvite => {
                join.join_company(user_id, notification.group.id, confirm)
                    .await?;
            }
            NotificationKind::CorpModInvite => {
                join.join_company_as_corp_mod(user_id, notification.group.id, confirm)
                    .await?;
            }
            // Informational notifications only get marked redeemed
            NotificationKind::JoinedLeague
            | NotificationKind::Onboarding
            | NotificationKind::MissingStats
            | NotificationKind::DisconnectedMethod => {}
        }

        Ok(())
    }

    /// Withdraw every live notification concerning a group, e.g. when the
    /// league behind the invites is deleted.
    pub async fn withdraw(&self, group_id: Uuid) -> Result<()> {
        self.store.withdraw_notifications_for_group(group_id).await
    }

    async fn send_invite_email(
        &self,
        kind: NotificationKind,
        group: &GroupRef,
        user: &User,
        inviter_name: &str,
    ) {
        if !user.wants_invite_emails() {
            return;
        }
        let Some(address) = user.email.as_deref() else {
            return;
        };

        let sent = match kind {
            NotificationKind::CompanyInvite | NotificationKind::CorpModInvite => {
                self.email
                    .send_company_invitation(&group.name, group.id, address, inviter_name)
                    .await
            }
            _ => {
                self.email
                    .send_league_invitation(&group.name, group.id, address, inviter_name)
                    .await
            }
        };

        if let Err(err) = sent {
            tracing::warn!(
                user = %user.id,
                group = %group.id,
                error = %err,
                "Failed to send invitation email"
            );
        }
    }
}
