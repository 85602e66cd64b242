use diesel::prelude::*;

use crate::core::unix_millis;
use crate::schema::*;
use crate::user::DbUser;
use crate::{DataResult, connect};

#[derive(Identifiable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = rooms)]
pub struct DbRoom {
    pub id: i64,
    pub server_id: String,
    pub room_id: String,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub creator: Option<String>,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = rooms)]
pub struct NewDbRoom {
    pub server_id: String,
    pub room_id: String,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub creator: Option<String>,
    pub created_at: i64,
}

#[derive(Identifiable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = room_members)]
pub struct DbRoomMember {
    pub id: i64,
    pub server_id: String,
    pub room_id: i64,
    pub user_id: i64,
    pub accepted: bool,
    pub banned: bool,
    pub state: Option<String>,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = room_members)]
pub struct NewDbRoomMember {
    pub server_id: String,
    pub room_id: i64,
    pub user_id: i64,
    pub accepted: bool,
    pub banned: bool,
    pub state: Option<String>,
    pub created_at: i64,
}

impl NewDbRoomMember {
    /// An accepted, unbanned membership.
    pub fn joined(server_id: &str, room_id: i64, user_id: i64) -> Self {
        Self {
            server_id: server_id.to_owned(),
            room_id,
            user_id,
            accepted: true,
            banned: false,
            state: None,
            created_at: unix_millis(),
        }
    }
}

pub fn create_room(new_room: &NewDbRoom) -> DataResult<DbRoom> {
    diesel::insert_into(rooms::table)
        .values(new_room)
        .get_result::<DbRoom>(&mut connect()?)
        .map_err(Into::into)
}

pub fn room_exists(room_id: &str) -> DataResult<bool> {
    diesel::select(diesel::dsl::exists(
        rooms::table.filter(rooms::room_id.eq(room_id)),
    ))
    .get_result::<bool>(&mut connect()?)
    .map_err(Into::into)
}

pub fn list_rooms(server_id: &str) -> DataResult<Vec<DbRoom>> {
    rooms::table
        .filter(rooms::server_id.eq(server_id))
        .order(rooms::id.asc())
        .load::<DbRoom>(&mut connect()?)
        .map_err(Into::into)
}

pub fn add_member(new_member: &NewDbRoomMember) -> DataResult<DbRoomMember> {
    diesel::insert_into(room_members::table)
        .values(new_member)
        .get_result::<DbRoomMember>(&mut connect()?)
        .map_err(Into::into)
}

/// Users holding an accepted, unbanned membership without a pending state.
pub fn list_active_members(room_id: i64) -> DataResult<Vec<DbUser>> {
    room_members::table
        .inner_join(users::table)
        .filter(room_members::room_id.eq(room_id))
        .filter(room_members::state.is_null())
        .filter(room_members::banned.eq(false))
        .filter(room_members::accepted.eq(true))
        .order(room_members::id.asc())
        .select(DbUser::as_select())
        .load::<DbUser>(&mut connect()?)
        .map_err(Into::into)
}
