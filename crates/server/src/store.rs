use crate::data::room::{DbRoom, DbRoomMember, NewDbRoom, NewDbRoomMember};
use crate::data::user::{DbPassword, DbToken, DbUser, NewDbPassword, NewDbToken, NewDbUser};
use crate::data::{self, DataResult, ResetSummary};

#[cfg(any(test, feature = "test-support"))]
mod memory;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

/// Persistence used by the backoffice handlers.
///
/// Every lookup that takes a `server_id` is scoped to that tenant; row ids
/// are global.
pub trait BackofficeStore: Send + Sync {
    fn get_user(&self, server_id: &str, user_id: &str) -> DataResult<Option<DbUser>>;
    fn create_user(&self, new_user: &NewDbUser) -> DataResult<DbUser>;
    fn list_users(&self, server_id: &str) -> DataResult<Vec<DbUser>>;
    fn find_admin(&self, server_id: &str) -> DataResult<Option<DbUser>>;
    fn set_password_pattern(&self, id: i64, pattern: &str) -> DataResult<()>;

    fn get_token_for_user(&self, user_id: i64) -> DataResult<Option<DbToken>>;
    fn create_token(&self, new_token: &NewDbToken) -> DataResult<DbToken>;
    fn is_valid_access_token(&self, server_id: &str, access_token: &str) -> DataResult<bool>;

    fn get_password_for_user(&self, user_id: i64) -> DataResult<Option<DbPassword>>;
    fn create_password(&self, new_password: &NewDbPassword) -> DataResult<DbPassword>;

    fn create_room(&self, new_room: &NewDbRoom) -> DataResult<DbRoom>;
    fn room_exists(&self, room_id: &str) -> DataResult<bool>;
    fn list_rooms(&self, server_id: &str) -> DataResult<Vec<DbRoom>>;
    fn add_member(&self, new_member: &NewDbRoomMember) -> DataResult<DbRoomMember>;
    fn list_active_members(&self, room_id: i64) -> DataResult<Vec<DbUser>>;

    fn reset_server(&self, server_id: &str) -> DataResult<ResetSummary>;
}

/// The PostgreSQL store behind the global diesel pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct DbStore;

impl BackofficeStore for DbStore {
    fn get_user(&self, server_id: &str, user_id: &str) -> DataResult<Option<DbUser>> {
        data::user::get_user(server_id, user_id)
    }
    fn create_user(&self, new_user: &NewDbUser) -> DataResult<DbUser> {
        data::user::create_user(new_user)
    }
    fn list_users(&self, server_id: &str) -> DataResult<Vec<DbUser>> {
        data::user::list_users(server_id)
    }
    fn find_admin(&self, server_id: &str) -> DataResult<Option<DbUser>> {
        data::user::find_admin(server_id)
    }
    fn set_password_pattern(&self, id: i64, pattern: &str) -> DataResult<()> {
        data::user::set_password_pattern(id, pattern)
    }

    fn get_token_for_user(&self, user_id: i64) -> DataResult<Option<DbToken>> {
        data::user::get_token_for_user(user_id)
    }
    fn create_token(&self, new_token: &NewDbToken) -> DataResult<DbToken> {
        data::user::create_token(new_token)
    }
    fn is_valid_access_token(&self, server_id: &str, access_token: &str) -> DataResult<bool> {
        data::user::is_valid_access_token(server_id, access_token)
    }

    fn get_password_for_user(&self, user_id: i64) -> DataResult<Option<DbPassword>> {
        data::user::get_password_for_user(user_id)
    }
    fn create_password(&self, new_password: &NewDbPassword) -> DataResult<DbPassword> {
        data::user::create_password(new_password)
    }

    fn create_room(&self, new_room: &NewDbRoom) -> DataResult<DbRoom> {
        data::room::create_room(new_room)
    }
    fn room_exists(&self, room_id: &str) -> DataResult<bool> {
        data::room::room_exists(room_id)
    }
    fn list_rooms(&self, server_id: &str) -> DataResult<Vec<DbRoom>> {
        data::room::list_rooms(server_id)
    }
    fn add_member(&self, new_member: &NewDbRoomMember) -> DataResult<DbRoomMember> {
        data::room::add_member(new_member)
    }
    fn list_active_members(&self, room_id: i64) -> DataResult<Vec<DbUser>> {
        data::room::list_active_members(room_id)
    }

    fn reset_server(&self, server_id: &str) -> DataResult<ResetSummary> {
        data::reset_server(server_id)
    }
}
