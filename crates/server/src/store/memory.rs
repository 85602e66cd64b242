use std::sync::{Mutex, MutexGuard, PoisonError};

use super::BackofficeStore;
use crate::data::room::{DbRoom, DbRoomMember, NewDbRoom, NewDbRoomMember};
use crate::data::user::{DbPassword, DbToken, DbUser, NewDbPassword, NewDbToken, NewDbUser};
use crate::data::{DataError, DataResult, ResetSummary};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<DbUser>,
    tokens: Vec<DbToken>,
    passwords: Vec<DbPassword>,
    rooms: Vec<DbRoom>,
    members: Vec<DbRoomMember>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store kept in process memory, with the same uniqueness and cascade rules
/// as the SQL schema. Media rows are not tracked.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BackofficeStore for MemoryStore {
    fn get_user(&self, server_id: &str, user_id: &str) -> DataResult<Option<DbUser>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.server_id == server_id && u.user_id == user_id)
            .cloned())
    }

    fn create_user(&self, new_user: &NewDbUser) -> DataResult<DbUser> {
        let mut tables = self.lock();
        if tables
            .users
            .iter()
            .any(|u| u.server_id == new_user.server_id && u.user_id == new_user.user_id)
        {
            return Err(DataError::public(format!(
                "user {} already exists",
                new_user.user_id
            )));
        }
        let user = DbUser {
            id: tables.next_id(),
            server_id: new_user.server_id.clone(),
            user_id: new_user.user_id.clone(),
            display_name: new_user.display_name.clone(),
            is_admin: new_user.is_admin,
            password_pattern: new_user.password_pattern.clone(),
            created_at: new_user.created_at,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    fn list_users(&self, server_id: &str) -> DataResult<Vec<DbUser>> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.server_id == server_id)
            .cloned()
            .collect())
    }

    fn find_admin(&self, server_id: &str) -> DataResult<Option<DbUser>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.server_id == server_id && u.is_admin)
            .cloned())
    }

    fn set_password_pattern(&self, id: i64, pattern: &str) -> DataResult<()> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            user.password_pattern = Some(pattern.to_owned());
        }
        Ok(())
    }

    fn get_token_for_user(&self, user_id: i64) -> DataResult<Option<DbToken>> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    fn create_token(&self, new_token: &NewDbToken) -> DataResult<DbToken> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == new_token.user_id) {
            return Err(DataError::public("token owner does not exist"));
        }
        let token = DbToken {
            id: tables.next_id(),
            server_id: new_token.server_id.clone(),
            user_id: new_token.user_id,
            access_token: new_token.access_token.clone(),
            refresh_token: new_token.refresh_token.clone(),
            expires_in_ms: new_token.expires_in_ms,
            created_at: new_token.created_at,
        };
        tables.tokens.push(token.clone());
        Ok(token)
    }

    fn is_valid_access_token(&self, server_id: &str, access_token: &str) -> DataResult<bool> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .any(|t| t.server_id == server_id && t.access_token == access_token))
    }

    fn get_password_for_user(&self, user_id: i64) -> DataResult<Option<DbPassword>> {
        Ok(self
            .lock()
            .passwords
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    fn create_password(&self, new_password: &NewDbPassword) -> DataResult<DbPassword> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == new_password.user_id) {
            return Err(DataError::public("password owner does not exist"));
        }
        let password = DbPassword {
            id: tables.next_id(),
            server_id: new_password.server_id.clone(),
            user_id: new_password.user_id,
            password: new_password.password.clone(),
            created_at: new_password.created_at,
        };
        tables.passwords.push(password.clone());
        Ok(password)
    }

    fn create_room(&self, new_room: &NewDbRoom) -> DataResult<DbRoom> {
        let mut tables = self.lock();
        if tables.rooms.iter().any(|r| r.room_id == new_room.room_id) {
            return Err(DataError::public(format!(
                "room {} already exists",
                new_room.room_id
            )));
        }
        let room = DbRoom {
            id: tables.next_id(),
            server_id: new_room.server_id.clone(),
            room_id: new_room.room_id.clone(),
            name: new_room.name.clone(),
            topic: new_room.topic.clone(),
            creator: new_room.creator.clone(),
            created_at: new_room.created_at,
        };
        tables.rooms.push(room.clone());
        Ok(room)
    }

    fn room_exists(&self, room_id: &str) -> DataResult<bool> {
        Ok(self.lock().rooms.iter().any(|r| r.room_id == room_id))
    }

    fn list_rooms(&self, server_id: &str) -> DataResult<Vec<DbRoom>> {
        Ok(self
            .lock()
            .rooms
            .iter()
            .filter(|r| r.server_id == server_id)
            .cloned()
            .collect())
    }

    fn add_member(&self, new_member: &NewDbRoomMember) -> DataResult<DbRoomMember> {
        let mut tables = self.lock();
        if !tables.rooms.iter().any(|r| r.id == new_member.room_id)
            || !tables.users.iter().any(|u| u.id == new_member.user_id)
        {
            return Err(DataError::public("membership references a missing row"));
        }
        let member = DbRoomMember {
            id: tables.next_id(),
            server_id: new_member.server_id.clone(),
            room_id: new_member.room_id,
            user_id: new_member.user_id,
            accepted: new_member.accepted,
            banned: new_member.banned,
            state: new_member.state.clone(),
            created_at: new_member.created_at,
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    fn list_active_members(&self, room_id: i64) -> DataResult<Vec<DbUser>> {
        let tables = self.lock();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.room_id == room_id && m.state.is_none() && !m.banned && m.accepted)
            .filter_map(|m| tables.users.iter().find(|u| u.id == m.user_id).cloned())
            .collect())
    }

    fn reset_server(&self, server_id: &str) -> DataResult<ResetSummary> {
        let mut tables = self.lock();
        let users_before = tables.users.len();
        let rooms_before = tables.rooms.len();
        tables.users.retain(|u| u.server_id != server_id);
        tables.rooms.retain(|r| r.server_id != server_id);

        let Tables {
            users,
            tokens,
            passwords,
            rooms,
            members,
            ..
        } = &mut *tables;
        tokens.retain(|t| users.iter().any(|u| u.id == t.user_id));
        passwords.retain(|p| users.iter().any(|u| u.id == p.user_id));
        members.retain(|m| {
            rooms.iter().any(|r| r.id == m.room_id) && users.iter().any(|u| u.id == m.user_id)
        });

        Ok(ResetSummary {
            users: users_before - users.len(),
            rooms: rooms_before - rooms.len(),
            medias: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &MemoryStore, server_id: &str) -> (DbUser, DbRoom) {
        let user = store
            .create_user(&NewDbUser::new(server_id, "@alice:example.org", None, false))
            .unwrap();
        let room = store
            .create_room(&NewDbRoom {
                server_id: server_id.to_owned(),
                room_id: format!("!{server_id}:example.org"),
                name: Some("lobby".to_owned()),
                topic: None,
                creator: None,
                created_at: 0,
            })
            .unwrap();
        store
            .add_member(&NewDbRoomMember::joined(server_id, room.id, user.id))
            .unwrap();
        (user, room)
    }

    #[test]
    fn users_are_unique_per_tenant() {
        let store = MemoryStore::new();
        let user = NewDbUser::new("a", "@bob:example.org", None, false);
        store.create_user(&user).unwrap();
        assert!(store.create_user(&user).is_err());
        store
            .create_user(&NewDbUser::new("b", "@bob:example.org", None, false))
            .unwrap();
        assert!(store.get_user("b", "@bob:example.org").unwrap().is_some());
    }

    #[test]
    fn inactive_memberships_are_hidden() {
        let store = MemoryStore::new();
        let (alice, room) = seed(&store, "a");
        let bob = store
            .create_user(&NewDbUser::new("a", "@bob:example.org", None, false))
            .unwrap();
        let mut banned = NewDbRoomMember::joined("a", room.id, bob.id);
        banned.banned = true;
        store.add_member(&banned).unwrap();

        let members = store.list_active_members(room.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, alice.id);
    }

    #[test]
    fn reset_cascades_within_one_tenant() {
        let store = MemoryStore::new();
        let (alice, room) = seed(&store, "a");
        let (other, _) = seed(&store, "b");
        store
            .create_token(&NewDbToken {
                server_id: "a".to_owned(),
                user_id: alice.id,
                access_token: "token-a".to_owned(),
                refresh_token: "refresh-a".to_owned(),
                expires_in_ms: None,
                created_at: 0,
            })
            .unwrap();

        let summary = store.reset_server("a").unwrap();
        assert_eq!(summary.users, 1);
        assert_eq!(summary.rooms, 1);
        assert!(store.list_users("a").unwrap().is_empty());
        assert!(!store.is_valid_access_token("a", "token-a").unwrap());
        assert!(store.list_active_members(room.id).unwrap().is_empty());
        assert_eq!(store.list_users("b").unwrap()[0].id, other.id);
    }
}
