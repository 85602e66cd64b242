//! Tenant operations behind the backoffice routes.
//!
//! Handlers in [`crate::routing`] deal with HTTP; everything here works on a
//! [`BackofficeStore`] so it runs the same against PostgreSQL and memory.

use std::collections::{BTreeMap, HashSet};

use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;
use crate::core::credential::{generate_access_token, hash_password};
use crate::core::validation::{check_user_id, validate_request};
use crate::core::{JsonObject, JsonValue, RoomId, UserId, unix_millis};
use crate::data::ResetSummary;
use crate::data::room::{DbRoom, NewDbRoom, NewDbRoomMember};
use crate::data::user::{DbUser, NewDbPassword, NewDbToken, NewDbUser};
use crate::store::BackofficeStore;
use crate::{AppResult, MatrixError};

const USER_FIELDS: &[&str] = &["id", "fullname"];

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub displayname: Option<String>,
    pub admin: bool,
}

impl From<&DbUser> for UserInfo {
    fn from(user: &DbUser) -> Self {
        Self {
            user_id: user.user_id.clone(),
            displayname: user.display_name.clone(),
            admin: user.is_admin,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: String,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub creator: Option<String>,
}

impl From<&DbRoom> for RoomInfo {
    fn from(room: &DbRoom) -> Self {
        Self {
            room_id: room.room_id.clone(),
            name: room.name.clone(),
            topic: room.topic.clone(),
            creator: room.creator.clone(),
        }
    }
}

/// A room together with its active members.
#[derive(Serialize, Debug, Clone)]
pub struct RoomWithMembers {
    #[serde(flatten)]
    pub room: RoomInfo,
    pub members: Vec<UserInfo>,
}

/// A room created by [`create_batch`], members listed by user id.
#[derive(Serialize, Debug, Clone)]
pub struct CreatedRoom {
    #[serde(flatten)]
    pub room: RoomInfo,
    #[serde(rename = "roomID")]
    pub room_id: String,
    pub members: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct AdminCredentials {
    pub user_id: String,
    pub password: String,
    pub access_token: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct CreatedBatch {
    pub users: BTreeMap<String, UserInfo>,
    pub rooms: Vec<CreatedRoom>,
}

/// A room entry of a bulk create request.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RoomEntry {
    pub name: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

struct UserEntry {
    id: UserId,
    fullname: String,
}

/// Finds or creates the tenant admin and makes sure it has a token and a
/// password.
///
/// Calling it again is harmless: existing rows are reused and the password
/// pattern is only written when a password row is created.
pub fn create_admin(
    store: &dyn BackofficeStore,
    server_id: &str,
    admin: &AdminConfig,
) -> AppResult<AdminCredentials> {
    let user = match store.get_user(server_id, &admin.user_id)? {
        Some(user) => user,
        None => {
            let user = store.create_user(&NewDbUser::new(
                server_id,
                &admin.user_id,
                Some(admin.display_name.clone()),
                true,
            ))?;
            tracing::info!(server_id, user_id = %user.user_id, "created tenant admin");
            user
        }
    };

    let token = match store.get_token_for_user(user.id)? {
        Some(token) => token,
        None => store.create_token(&NewDbToken {
            server_id: server_id.to_owned(),
            user_id: user.id,
            access_token: generate_access_token(),
            refresh_token: generate_access_token(),
            expires_in_ms: None,
            created_at: unix_millis(),
        })?,
    };

    if store.get_password_for_user(user.id)?.is_none() {
        let credential = hash_password(&admin.password_seed, None)?;
        store.create_password(&NewDbPassword {
            server_id: server_id.to_owned(),
            user_id: user.id,
            password: credential.token,
            created_at: unix_millis(),
        })?;
        if let Some(pattern) = credential.pattern {
            store.set_password_pattern(user.id, &pattern.to_string())?;
        }
    }

    Ok(AdminCredentials {
        user_id: user.user_id,
        password: admin.password_seed.clone(),
        access_token: token.access_token,
    })
}

pub fn reset(store: &dyn BackofficeStore, server_id: &str) -> AppResult<ResetSummary> {
    let summary = store.reset_server(server_id)?;
    tracing::info!(
        server_id,
        users = summary.users,
        rooms = summary.rooms,
        medias = summary.medias,
        "tenant reset"
    );
    Ok(summary)
}

pub fn list_users(store: &dyn BackofficeStore, server_id: &str) -> AppResult<Vec<UserInfo>> {
    Ok(store
        .list_users(server_id)?
        .iter()
        .map(UserInfo::from)
        .collect())
}

pub fn list_rooms(store: &dyn BackofficeStore, server_id: &str) -> AppResult<Vec<RoomWithMembers>> {
    store
        .list_rooms(server_id)?
        .iter()
        .map(|room| -> AppResult<RoomWithMembers> {
            let members = store
                .list_active_members(room.id)?
                .iter()
                .map(UserInfo::from)
                .collect();
            Ok(RoomWithMembers {
                room: room.into(),
                members,
            })
        })
        .collect()
}

/// Creates the users, then the rooms, of a bulk request.
///
/// The whole request is checked before the first write: user entries, user
/// ids already taken, the tenant admin, room members and room ids. Rooms are
/// created by the tenant admin and their ids are scoped to `host`.
pub fn create_batch(
    store: &dyn BackofficeStore,
    server_id: &str,
    host: &str,
    payload: &JsonObject,
) -> AppResult<CreatedBatch> {
    let users = match payload.get("users") {
        Some(users) => parse_users(users)?,
        None => Vec::new(),
    };
    let rooms = match payload.get("rooms") {
        Some(rooms) => serde_json::from_value::<Vec<RoomEntry>>(rooms.clone())?,
        None => Vec::new(),
    };

    let mut new_users = HashSet::with_capacity(users.len());
    for entry in &users {
        if !new_users.insert(entry.id.as_str())
            || store.get_user(server_id, entry.id.as_str())?.is_some()
        {
            return Err(
                MatrixError::user_in_use(format!("User ID already taken: {}", entry.id)).into(),
            );
        }
    }
    let admin = if rooms.is_empty() {
        None
    } else {
        let Some(admin) = store.find_admin(server_id)? else {
            return Err(MatrixError::not_found("No admin user exists for this server").into());
        };
        Some(admin)
    };
    let planned = plan_rooms(store, server_id, host, &new_users, rooms)?;

    let mut created = CreatedBatch::default();
    for entry in users {
        let user = store.create_user(&NewDbUser::new(
            server_id,
            entry.id.as_str(),
            Some(entry.fullname),
            false,
        ))?;
        created.users.insert(user.user_id.clone(), UserInfo::from(&user));
    }
    if let Some(admin) = admin {
        for room in planned {
            created
                .rooms
                .push(create_room(store, server_id, &admin, room)?);
        }
    }
    tracing::info!(
        server_id,
        users = created.users.len(),
        rooms = created.rooms.len(),
        "bulk create finished"
    );
    Ok(created)
}

struct PlannedRoom {
    room_id: RoomId,
    name: String,
    topic: Option<String>,
    members: Vec<String>,
}

/// Resolves names, members and ids of the requested rooms without writing.
///
/// A member must already exist in the tenant or be one of `new_users`.
fn plan_rooms(
    store: &dyn BackofficeStore,
    server_id: &str,
    host: &str,
    new_users: &HashSet<&str>,
    rooms: Vec<RoomEntry>,
) -> AppResult<Vec<PlannedRoom>> {
    let now_secs = unix_millis() / 1000;
    let mut taken = HashSet::with_capacity(rooms.len());
    let mut planned = Vec::with_capacity(rooms.len());
    for entry in rooms {
        for user_id in &entry.members {
            if !new_users.contains(user_id.as_str())
                && store.get_user(server_id, user_id)?.is_none()
            {
                return Err(MatrixError::not_found(format!("User {user_id} not found")).into());
            }
        }
        let name = entry
            .name
            .unwrap_or_else(|| rand::rng().random_range(0..i32::MAX).to_string());
        let room_id = free_room_id(store, server_id, host, &name, now_secs, &mut taken)?;
        planned.push(PlannedRoom {
            room_id,
            name,
            topic: entry.topic,
            members: entry.members,
        });
    }
    Ok(planned)
}

/// Derives a room id that is neither stored nor in `taken`, moving the
/// timestamp forward while a name repeated within one second collides.
fn free_room_id(
    store: &dyn BackofficeStore,
    server_id: &str,
    host: &str,
    name: &str,
    now_secs: i64,
    taken: &mut HashSet<RoomId>,
) -> AppResult<RoomId> {
    let mut secs = now_secs;
    loop {
        let room_id = RoomId::generate(server_id, name, secs, host);
        if !taken.contains(&room_id) && !store.room_exists(room_id.as_str())? {
            taken.insert(room_id.clone());
            return Ok(room_id);
        }
        secs = secs.saturating_add(1);
    }
}

fn create_room(
    store: &dyn BackofficeStore,
    server_id: &str,
    admin: &DbUser,
    planned: PlannedRoom,
) -> AppResult<CreatedRoom> {
    let room = store.create_room(&NewDbRoom {
        server_id: server_id.to_owned(),
        room_id: planned.room_id.to_string(),
        name: Some(planned.name),
        topic: planned.topic,
        creator: Some(admin.user_id.clone()),
        created_at: unix_millis(),
    })?;

    let mut members = Vec::with_capacity(planned.members.len());
    for user_id in &planned.members {
        let Some(user) = store.get_user(server_id, user_id)? else {
            return Err(MatrixError::not_found(format!("User {user_id} not found")).into());
        };
        store.add_member(&NewDbRoomMember::joined(server_id, room.id, user.id))?;
        members.push(user.user_id);
    }

    Ok(CreatedRoom {
        room: (&room).into(),
        room_id: room.room_id.clone(),
        members,
    })
}

fn parse_users(users: &JsonValue) -> AppResult<Vec<UserEntry>> {
    let Some(users) = users.as_array() else {
        return Err(MatrixError::bad_json("'users' must be a list").into());
    };
    users
        .iter()
        .map(|user| -> AppResult<UserEntry> {
            let Some(fields) = user.as_object() else {
                return Err(MatrixError::bad_json("user entries must be objects").into());
            };
            validate_request(fields, USER_FIELDS)?;
            let id = fields.get("id").unwrap_or(&JsonValue::Null);
            check_user_id(id)?;
            let (Some(id), Some(fullname)) = (
                id.as_str(),
                fields.get("fullname").and_then(JsonValue::as_str),
            ) else {
                return Err(
                    MatrixError::invalid_param("'id' and 'fullname' must be strings").into(),
                );
            };
            Ok(UserEntry {
                id: UserId::parse(id)?,
                fullname: fullname.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches2::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::core::ErrorKind;
    use crate::core::credential::{DashPattern, base_string};
    use crate::AppError;
    use crate::store::MemoryStore;

    fn payload(value: JsonValue) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    fn matrix_kind(result: AppResult<impl std::fmt::Debug>) -> ErrorKind {
        match result {
            Err(AppError::Matrix(e)) => e.kind,
            other => panic!("expected a matrix error, got {other:?}"),
        }
    }

    #[test]
    fn create_admin_is_idempotent() {
        let store = MemoryStore::new();
        let config = AdminConfig::default();
        let first = create_admin(&store, "t1", &config).unwrap();
        let second = create_admin(&store, "t1", &config).unwrap();

        assert_eq!(first.user_id, "@admin:synapse");
        assert_eq!(first.password, "password");
        assert_eq!(first.access_token, second.access_token);
        assert_eq!(store.list_users("t1").unwrap().len(), 1);
        assert!(store.is_valid_access_token("t1", &first.access_token).unwrap());
        assert!(!store.is_valid_access_token("t2", &first.access_token).unwrap());
    }

    #[test]
    fn admin_password_replays_from_stored_pattern() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();

        let admin = store.find_admin("t1").unwrap().unwrap();
        let stored = store.get_password_for_user(admin.id).unwrap().unwrap();
        let pattern = admin.password_pattern.unwrap();

        assert_eq!(DashPattern::from_token(&stored.password).to_string(), pattern);
        assert_eq!(stored.password.replace('-', ""), base_string("password"));
        let replayed = hash_password("password", Some(&pattern)).unwrap();
        assert_eq!(replayed.token, stored.password);
    }

    #[test]
    fn batch_creates_users_and_rooms() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        let created = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({
                "users": [
                    {"id": "@alice:example.org", "fullname": "Alice"},
                    {"id": "@bob:example.org", "fullname": "Bob"}
                ],
                "rooms": [
                    {"name": "lobby", "topic": "hello", "members": ["@alice:example.org"]},
                    {}
                ]
            })),
        )
        .unwrap();

        assert_eq!(created.users.len(), 2);
        assert_eq!(
            created.users["@alice:example.org"].displayname.as_deref(),
            Some("Alice")
        );
        assert_eq!(created.rooms.len(), 2);

        let lobby = &created.rooms[0];
        assert_eq!(lobby.room.name.as_deref(), Some("lobby"));
        assert_eq!(lobby.room.creator.as_deref(), Some("@admin:synapse"));
        assert!(lobby.room_id.starts_with('!'));
        assert!(lobby.room_id.ends_with(":example.org"));
        assert_eq!(lobby.members, vec!["@alice:example.org".to_owned()]);

        let unnamed = &created.rooms[1];
        assert_matches!(unnamed.room.name.as_deref().map(str::parse::<i64>), Some(Ok(_)));

        let rooms = list_rooms(&store, "t1").unwrap();
        assert_eq!(rooms[0].members.len(), 1);
        assert_eq!(rooms[0].members[0].user_id, "@alice:example.org");
    }

    #[test]
    fn batch_rejects_invalid_users() {
        let store = MemoryStore::new();
        let missing = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({"users": [{"id": "@carol:example.org"}]})),
        );
        assert_eq!(matrix_kind(missing), ErrorKind::Unknown);

        let numeric = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({"users": [{"id": "@1234:example.org", "fullname": "Guest"}]})),
        );
        assert_eq!(matrix_kind(numeric), ErrorKind::InvalidUsername);
        assert!(store.list_users("t1").unwrap().is_empty());
    }

    #[test]
    fn batch_rejects_duplicates_and_unknown_members() {
        let store = MemoryStore::new();
        let body = payload(json!({"users": [{"id": "@dave:example.org", "fullname": "Dave"}]}));
        create_batch(&store, "t1", "example.org", &body).unwrap();
        assert_eq!(
            matrix_kind(create_batch(&store, "t1", "example.org", &body)),
            ErrorKind::UserInUse
        );

        let repeated = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({"users": [
                {"id": "@erin:example.org", "fullname": "Erin"},
                {"id": "@erin:example.org", "fullname": "Erin again"}
            ]})),
        );
        assert_eq!(matrix_kind(repeated), ErrorKind::UserInUse);
        assert!(store.get_user("t1", "@erin:example.org").unwrap().is_none());

        let no_admin = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({"rooms": [{"name": "lobby"}]})),
        );
        assert_eq!(matrix_kind(no_admin), ErrorKind::NotFound);

        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        let unknown = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({"rooms": [{"name": "lobby", "members": ["@eve:example.org"]}]})),
        );
        assert_eq!(matrix_kind(unknown), ErrorKind::NotFound);
        assert!(store.list_rooms("t1").unwrap().is_empty());
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        let result = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({
                "users": [{"id": "@frank:example.org", "fullname": "Frank"}],
                "rooms": [
                    {"name": "lobby", "members": ["@frank:example.org"]},
                    {"name": "attic", "members": ["@ghost:example.org"]}
                ]
            })),
        );

        assert_eq!(matrix_kind(result), ErrorKind::NotFound);
        assert!(store.list_rooms("t1").unwrap().is_empty());
        assert!(store.get_user("t1", "@frank:example.org").unwrap().is_none());
    }

    #[test]
    fn members_may_be_created_in_the_same_batch() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        let created = create_batch(
            &store,
            "t1",
            "example.org",
            &payload(json!({
                "users": [{"id": "@grace:example.org", "fullname": "Grace"}],
                "rooms": [{"name": "lobby", "members": ["@grace:example.org"]}]
            })),
        )
        .unwrap();
        assert_eq!(created.rooms[0].members, vec!["@grace:example.org".to_owned()]);
    }

    #[test]
    fn same_named_rooms_get_distinct_ids() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        let body = payload(json!({"rooms": [{"name": "lobby"}, {"name": "lobby"}]}));
        let first = create_batch(&store, "t1", "example.org", &body).unwrap();
        let second = create_batch(&store, "t1", "example.org", &body).unwrap();

        let mut ids: Vec<_> = first
            .rooms
            .iter()
            .chain(&second.rooms)
            .map(|room| room.room_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(store.list_rooms("t1").unwrap().len(), 4);
    }

    #[test]
    fn reset_only_touches_one_tenant() {
        let store = MemoryStore::new();
        create_admin(&store, "t1", &AdminConfig::default()).unwrap();
        create_admin(&store, "t2", &AdminConfig::default()).unwrap();

        let summary = reset(&store, "t1").unwrap();
        assert_eq!(summary.users, 1);
        assert!(list_users(&store, "t1").unwrap().is_empty());
        assert_eq!(list_users(&store, "t2").unwrap().len(), 1);
    }
}
