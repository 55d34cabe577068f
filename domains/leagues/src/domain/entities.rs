//! Domain entities for the Kudos leagues domain
//!
//! These types double as the persisted document shapes: serde renames pin
//! every field to the legacy wire contract (`_id`, `leagueType`, `teamSize`,
//! `startDate`, `memberCount`, `redeemedAt`, ...) that reporting and admin
//! collaborators read directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kudos_common::{Error, Result};

/// Role granted to users who administer the whole platform.
pub const ROLE_ADMIN: &str = "admin";

/// Role granted to users who moderate their company.
pub const ROLE_CORPORATE_MOD: &str = "corporate_mod";

/// League shapes supported by the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueType {
    /// Created by any user; membership by invitation
    Private,
    /// Owned and moderated by a single company
    Corporate,
    /// Open across companies; panels group members per company
    Public,
}

impl std::fmt::Display for LeagueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeagueType::Private => write!(f, "private"),
            LeagueType::Corporate => write!(f, "corporate"),
            LeagueType::Public => write!(f, "public"),
        }
    }
}

/// A single member or moderator entry on a league, team, panel, or company.
///
/// `activated` distinguishes "invited, pending" from "confirmed"; `active`
/// records the answer the user gave when confirming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub user: Uuid,
    pub active: bool,
    pub activated: bool,
    pub start_date: DateTime<Utc>,
}

impl MemberEntry {
    pub fn new(user: Uuid, active: bool, activated: bool) -> Self {
        Self {
            user,
            active,
            activated,
            start_date: Utc::now(),
        }
    }
}

/// Ordered member list with the upsert-or-append operation used everywhere a
/// membership array appears. An entry is unique per user id; upserting an
/// existing user updates the entry in place and never duplicates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberList(Vec<MemberEntry>);

impl MemberList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberEntry> {
        self.0.iter()
    }

    pub fn get(&self, user: Uuid) -> Option<&MemberEntry> {
        self.0.iter().find(|entry| entry.user == user)
    }

    /// True if the user has any entry, pending or confirmed.
    pub fn contains(&self, user: Uuid) -> bool {
        self.get(user).is_some()
    }

    /// True if the user has confirmed their entry.
    pub fn is_activated(&self, user: Uuid) -> bool {
        self.get(user).map(|e| e.activated).unwrap_or(false)
    }

    /// True if the user has a confirmed, currently-active entry.
    pub fn is_active(&self, user: Uuid) -> bool {
        self.get(user).map(|e| e.active && e.activated).unwrap_or(false)
    }

    /// Update the user's entry in place, or append a new one.
    pub fn upsert(&mut self, entry: MemberEntry) {
        match self.0.iter_mut().find(|e| e.user == entry.user) {
            Some(existing) => *existing = entry,
            None => self.0.push(entry),
        }
    }

    /// Remove the user's entry. Returns whether an entry was removed.
    pub fn remove(&mut self, user: Uuid) -> bool {
        let before = self.0.len();
        self.0.retain(|e| e.user != user);
        self.0.len() != before
    }
}

impl FromIterator<MemberEntry> for MemberList {
    fn from_iter<I: IntoIterator<Item = MemberEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reference from a league to one of its panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRef {
    pub panel_id: Uuid,
}

/// Reference from a panel to one of its teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub team_id: Uuid,
}

/// Reference from a company to one of its leagues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueRef {
    pub league_id: Uuid,
}

/// League entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub league_type: LeagueType,
    /// None or 1 for individual leagues; >= 2 for group leagues
    pub team_size: Option<i32>,
    pub min_team_size: Option<i32>,
    pub panel: Vec<PanelRef>,
    pub members: MemberList,
    pub moderators: MemberList,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl League {
    /// Create a new league with validation
    pub fn new(
        name: String,
        league_type: LeagueType,
        team_size: Option<i32>,
        min_team_size: Option<i32>,
    ) -> Result<Self> {
        if name.is_empty() || name.len() > 100 {
            return Err(Error::Validation(
                "League name must be 1-100 characters".to_string(),
            ));
        }

        if let Some(size) = team_size {
            if size < 1 {
                return Err(Error::Validation(
                    "Team size must be at least 1".to_string(),
                ));
            }
            if let Some(min) = min_team_size {
                if min < 0 || min > size {
                    return Err(Error::Validation(
                        "Minimum team size cannot exceed team size".to_string(),
                    ));
                }
            }
        }

        Ok(League {
            id: Uuid::new_v4(),
            name,
            league_type,
            team_size,
            min_team_size,
            panel: Vec::new(),
            members: MemberList::new(),
            moderators: MemberList::new(),
            deleted: false,
            created_at: Utc::now(),
        })
    }

    /// A group league allocates its members into teams; an individual league
    /// (team size absent or 1) never does.
    pub fn is_group(&self) -> bool {
        self.team_size.map(|size| size > 1).unwrap_or(false)
    }

    pub fn panel_ids(&self) -> Vec<Uuid> {
        self.panel.iter().map(|p| p.panel_id).collect()
    }

    pub fn has_panel(&self, panel_id: Uuid) -> bool {
        self.panel.iter().any(|p| p.panel_id == panel_id)
    }
}

/// Panel entity: a named category within a league that owns teams.
///
/// `members` mirrors the active team membership beneath the panel so the
/// switch flow can locate users without loading every team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub team: Vec<TeamRef>,
    pub members: MemberList,
    #[serde(default)]
    pub deleted: bool,
}

impl Panel {
    pub fn new(name: String) -> Self {
        Panel {
            id: Uuid::new_v4(),
            name,
            team: Vec::new(),
            members: MemberList::new(),
            deleted: false,
        }
    }

    pub fn team_ids(&self) -> Vec<Uuid> {
        self.team.iter().map(|t| t.team_id).collect()
    }
}

/// Back-reference from a team to its owning panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPanelRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// Team entity: a capacity-bounded group of league members within a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub member_count: i32,
    pub members: MemberList,
    pub panel: TeamPanelRef,
    pub moderators: MemberList,
    #[serde(default)]
    pub deleted: bool,
}

impl Team {
    /// Create a new empty team. Moderators are copied from the league.
    pub fn new(name: String, panel: TeamPanelRef, moderators: MemberList) -> Self {
        Team {
            id: Uuid::new_v4(),
            name,
            member_count: 0,
            members: MemberList::new(),
            panel,
            moderators,
            deleted: false,
        }
    }

    /// True when another member still fits under the league's team size.
    pub fn has_capacity(&self, team_size: i32) -> bool {
        (self.members.len() as i32) < team_size
    }
}

/// Company entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub members: MemberList,
    pub moderators: MemberList,
    pub leagues: Vec<LeagueRef>,
    /// Roles propagated onto users who join the company
    pub roles: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Company {
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() || name.len() > 100 {
            return Err(Error::Validation(
                "Company name must be 1-100 characters".to_string(),
            ));
        }

        Ok(Company {
            id: Uuid::new_v4(),
            name,
            members: MemberList::new(),
            moderators: MemberList::new(),
            leagues: Vec::new(),
            roles: Vec::new(),
            deleted: false,
        })
    }

    pub fn owns_league(&self, league_id: Uuid) -> bool {
        self.leagues.iter().any(|l| l.league_id == league_id)
    }
}

/// Per-user email delivery preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPreferences {
    #[serde(default = "default_true")]
    pub league_invites: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EmailPreferences {
    fn default() -> Self {
        Self {
            league_invites: true,
        }
    }
}

/// User profile as the membership engine sees it. Account management lives
/// upstream; this document carries the fields joins and invites touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Display name of the user's company, propagated on company join
    pub company: Option<String>,
    pub roles: Vec<String>,
    #[serde(default)]
    pub email_preferences: EmailPreferences,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        User {
            id,
            name: None,
            email: None,
            company: None,
            roles: Vec::new(),
            email_preferences: EmailPreferences::default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }

    pub fn wants_invite_emails(&self) -> bool {
        self.email_preferences.league_invites
    }
}

/// Discriminator for notifications. Invite kinds dispatch to a join
/// operation on confirmation; the rest are informational and only get
/// marked redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    IndLeagueInvite,
    GroupLeagueInvite,
    CompanyInvite,
    CorpModInvite,
    JoinedLeague,
    Onboarding,
    MissingStats,
    DisconnectedMethod,
}

impl NotificationKind {
    pub fn is_invite(&self) -> bool {
        matches!(
            self,
            NotificationKind::IndLeagueInvite
                | NotificationKind::GroupLeagueInvite
                | NotificationKind::CompanyInvite
                | NotificationKind::CorpModInvite
        )
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            NotificationKind::IndLeagueInvite => "indLeagueInvite",
            NotificationKind::GroupLeagueInvite => "groupLeagueInvite",
            NotificationKind::CompanyInvite => "companyInvite",
            NotificationKind::CorpModInvite => "corpModInvite",
            NotificationKind::JoinedLeague => "joinedLeague",
            NotificationKind::Onboarding => "onboarding",
            NotificationKind::MissingStats => "missingStats",
            NotificationKind::DisconnectedMethod => "disconnectedMethod",
        };
        write!(f, "{}", tag)
    }
}

/// The user a notification is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// The league or company a notification concerns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// Notification entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: NotificationTarget,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub group: GroupRef,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panels: Option<Vec<PanelRef>>,
    #[serde(default)]
    pub deleted: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build a pending invite notification addressed to `user_id`.
    pub fn invite(
        kind: NotificationKind,
        user_id: Uuid,
        group: GroupRef,
        panels: Option<Vec<PanelRef>>,
        message: Option<String>,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            user: NotificationTarget { id: user_id },
            kind,
            group,
            messages: message.into_iter().collect(),
            panels,
            deleted: false,
            redeemed_at: None,
            created_at: Utc::now(),
        }
    }

    /// A live notification is pending (not redeemed) and not withdrawn.
    pub fn is_live(&self) -> bool {
        !self.deleted && self.redeemed_at.is_none()
    }
}
