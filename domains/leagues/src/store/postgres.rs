//! PostgreSQL membership store
//!
//! Each collection is persisted as a `(id UUID, doc JSONB)` table holding the
//! wire-shaped document. Mutations run as a read-modify-write inside a
//! transaction with `SELECT ... FOR UPDATE` row locking, which gives exactly
//! the single-document atomicity the engines rely on and nothing more.
//!
//! Queries use the runtime sqlx API (not the compile-time macros): the
//! documents are schemaless JSONB, and the workspace must build without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use kudos_common::{Error, Result};

use crate::domain::entities::{
    Company, League, MemberEntry, Notification, Panel, PanelRef, Team, TeamRef, User,
};
use crate::store::MembershipStore;

const LEAGUES: &str = "leagues";
const PANELS: &str = "panels";
const TEAMS: &str = "teams";
const COMPANIES: &str = "companies";
const USERS: &str = "users";
const NOTIFICATIONS: &str = "notifications";

const ALL_TABLES: &[&str] = &[LEAGUES, PANELS, TEAMS, COMPANIES, USERS, NOTIFICATIONS];

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the document tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for table in ALL_TABLES {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (id UUID PRIMARY KEY, doc JSONB NOT NULL)",
                table
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn fetch<T>(&self, table: &str, id: Uuid) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin + 'static,
    {
        let row: Option<(Json<T>,)> =
            sqlx::query_as(&format!("SELECT doc FROM {} WHERE id = $1", table))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn fetch_many<T>(&self, table: &str, ids: &[Uuid]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin + 'static,
    {
        let rows: Vec<(Json<T>,)> =
            sqlx::query_as(&format!("SELECT doc FROM {} WHERE id = ANY($1)", table))
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn fetch_where<T>(&self, table: &str, clause: &str, bound: serde_json::Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin + 'static,
    {
        let rows: Vec<(Json<T>,)> = sqlx::query_as(&format!(
            "SELECT doc FROM {} WHERE {}",
            table, clause
        ))
        .bind(Json(bound))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn insert<T>(&self, table: &str, id: Uuid, doc: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
            table
        ))
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Atomically mutate a single document under a row lock.
    async fn mutate<T, F>(&self, table: &str, id: Uuid, what: &str, f: F) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Unpin + 'static,
        F: FnOnce(&mut T) + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Json<T>,)> = sqlx::query_as(&format!(
            "SELECT doc FROM {} WHERE id = $1 FOR UPDATE",
            table
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let (Json(mut doc),) =
            row.ok_or_else(|| Error::NotFound(format!("{} not found", what)))?;

        f(&mut doc);

        sqlx::query(&format!("UPDATE {} SET doc = $2 WHERE id = $1", table))
            .bind(id)
            .bind(Json(doc))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PostgresStore {
    // --- leagues -----------------------------------------------------------

    async fn league(&self, id: Uuid) -> Result<Option<League>> {
        self.fetch(LEAGUES, id).await
    }

    async fn insert_league(&self, league: &League) -> Result<()> {
        self.insert(LEAGUES, league.id, league).await
    }

    async fn upsert_league_member(&self, league_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(LEAGUES, league_id, "League", |league: &mut League| {
            league.members.upsert(entry);
        })
        .await
    }

    async fn upsert_league_moderator(&self, league_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(LEAGUES, league_id, "League", |league: &mut League| {
            league.moderators.upsert(entry);
        })
        .await
    }

    async fn push_league_panel(&self, league_id: Uuid, panel: PanelRef) -> Result<()> {
        self.mutate(LEAGUES, league_id, "League", |league: &mut League| {
            league.panel.push(panel);
        })
        .await
    }

    async fn set_league_deleted(&self, league_id: Uuid) -> Result<()> {
        self.mutate(LEAGUES, league_id, "League", |league: &mut League| {
            league.deleted = true;
        })
        .await
    }

    async fn league_containing_panel(&self, panel_id: Uuid) -> Result<Option<League>> {
        let mut leagues: Vec<League> = self
            .fetch_where(LEAGUES, "doc->'panel' @> $1", json!([{ "panelId": panel_id }]))
            .await?;
        Ok(leagues.pop())
    }

    // --- panels ------------------------------------------------------------

    async fn panel(&self, id: Uuid) -> Result<Option<Panel>> {
        self.fetch(PANELS, id).await
    }

    async fn panels(&self, ids: &[Uuid]) -> Result<Vec<Panel>> {
        self.fetch_many(PANELS, ids).await
    }

    async fn insert_panel(&self, panel: &Panel) -> Result<()> {
        self.insert(PANELS, panel.id, panel).await
    }

    async fn push_panel_team(&self, panel_id: Uuid, team: TeamRef) -> Result<()> {
        self.mutate(PANELS, panel_id, "Panel", |panel: &mut Panel| {
            panel.team.push(team);
        })
        .await
    }

    async fn pull_panel_team(&self, panel_id: Uuid, team_id: Uuid) -> Result<()> {
        self.mutate(PANELS, panel_id, "Panel", |panel: &mut Panel| {
            panel.team.retain(|t| t.team_id != team_id);
        })
        .await
    }

    async fn upsert_panel_member(&self, panel_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(PANELS, panel_id, "Panel", |panel: &mut Panel| {
            panel.members.upsert(entry);
        })
        .await
    }

    async fn pull_panel_member(&self, panel_id: Uuid, user_id: Uuid) -> Result<()> {
        self.mutate(PANELS, panel_id, "Panel", |panel: &mut Panel| {
            panel.members.remove(user_id);
        })
        .await
    }

    async fn panel_containing_team(&self, team_id: Uuid) -> Result<Option<Panel>> {
        let mut panels: Vec<Panel> = self
            .fetch_where(PANELS, "doc->'team' @> $1", json!([{ "teamId": team_id }]))
            .await?;
        Ok(panels.pop())
    }

    // --- teams -------------------------------------------------------------

    async fn team(&self, id: Uuid) -> Result<Option<Team>> {
        self.fetch(TEAMS, id).await
    }

    async fn teams(&self, ids: &[Uuid]) -> Result<Vec<Team>> {
        self.fetch_many(TEAMS, ids).await
    }

    async fn insert_team(&self, team: &Team) -> Result<()> {
        self.insert(TEAMS, team.id, team).await
    }

    async fn add_team_member(&self, team_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(TEAMS, team_id, "Team", |team: &mut Team| {
            team.members.upsert(entry);
            team.member_count = team.members.len() as i32;
        })
        .await
    }

    async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        self.mutate(TEAMS, team_id, "Team", |team: &mut Team| {
            if team.members.remove(user_id) {
                team.member_count = team.members.len() as i32;
            }
        })
        .await
    }

    async fn delete_team(&self, team_id: Uuid) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", TEAMS))
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- companies ---------------------------------------------------------

    async fn company(&self, id: Uuid) -> Result<Option<Company>> {
        self.fetch(COMPANIES, id).await
    }

    async fn insert_company(&self, company: &Company) -> Result<()> {
        self.insert(COMPANIES, company.id, company).await
    }

    async fn companies_for_member(&self, user_id: Uuid) -> Result<Vec<Company>> {
        self.fetch_where(
            COMPANIES,
            "doc->'members' @> $1",
            json!([{ "user": user_id }]),
        )
        .await
    }

    async fn companies_moderated_by(&self, user_id: Uuid) -> Result<Vec<Company>> {
        self.fetch_where(
            COMPANIES,
            "doc->'moderators' @> $1",
            json!([{ "user": user_id, "active": true, "activated": true }]),
        )
        .await
    }

    async fn upsert_company_member(&self, company_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(COMPANIES, company_id, "Company", |company: &mut Company| {
            company.members.upsert(entry);
        })
        .await
    }

    async fn upsert_company_moderator(&self, company_id: Uuid, entry: MemberEntry) -> Result<()> {
        self.mutate(COMPANIES, company_id, "Company", |company: &mut Company| {
            company.moderators.upsert(entry);
        })
        .await
    }

    async fn push_company_league(
        &self,
        company_id: Uuid,
        league: crate::domain::entities::LeagueRef,
    ) -> Result<()> {
        self.mutate(COMPANIES, company_id, "Company", |company: &mut Company| {
            company.leagues.push(league);
        })
        .await
    }

    // --- users -------------------------------------------------------------

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        self.fetch(USERS, id).await
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.insert(USERS, user.id, user).await
    }

    async fn set_user_company(&self, user_id: Uuid, company: &str) -> Result<()> {
        let company = company.to_string();
        self.mutate(USERS, user_id, "User", move |user: &mut User| {
            user.company = Some(company);
        })
        .await
    }

    async fn add_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()> {
        let roles = roles.to_vec();
        self.mutate(USERS, user_id, "User", move |user: &mut User| {
            for role in roles {
                if !user.roles.contains(&role) {
                    user.roles.push(role);
                }
            }
        })
        .await
    }

    // --- notifications -----------------------------------------------------

    async fn notification(&self, id: Uuid) -> Result<Option<Notification>> {
        self.fetch(NOTIFICATIONS, id).await
    }

    async fn upsert_invite(&self, notification: &Notification) -> Result<Notification> {
        let mut tx = self.pool.begin().await?;

        // Lock the live record for this (user, group, type) key, if any
        let row: Option<(Uuid,)> = sqlx::query_as(&format!(
            "SELECT id FROM {} \
             WHERE doc->'user' @> $1 AND doc->'group' @> $2 AND doc->>'type' = $3 \
               AND (doc->>'deleted')::boolean = false AND doc->>'redeemedAt' IS NULL \
             FOR UPDATE",
            NOTIFICATIONS
        ))
        .bind(Json(json!({ "_id": notification.user.id })))
        .bind(Json(json!({ "_id": notification.group.id })))
        .bind(notification.kind.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let mut stored = notification.clone();
        if let Some((id,)) = row {
            stored.id = id;
        }

        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
            NOTIFICATIONS
        ))
        .bind(stored.id)
        .bind(Json(&stored))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn mark_redeemed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.mutate(
            NOTIFICATIONS,
            id,
            "Notification",
            move |notification: &mut Notification| {
                notification.redeemed_at = Some(at);
            },
        )
        .await
    }

    async fn live_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows: Vec<(Json<Notification>,)> = sqlx::query_as(&format!(
            "SELECT doc FROM {} \
             WHERE doc->'user' @> $1 \
               AND (doc->>'deleted')::boolean = false AND doc->>'redeemedAt' IS NULL \
             ORDER BY doc->>'createdAt'",
            NOTIFICATIONS
        ))
        .bind(Json(json!({ "_id": user_id })))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn withdraw_notifications_for_group(&self, group_id: Uuid) -> Result<()> {
        sqlx::query(&format!(
            "UPDATE {} SET doc = jsonb_set(doc, '{{deleted}}', 'true'::jsonb) \
             WHERE doc->'group' @> $1 \
               AND (doc->>'deleted')::boolean = false AND doc->>'redeemedAt' IS NULL",
            NOTIFICATIONS
        ))
        .bind(Json(json!({ "_id": group_id })))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
