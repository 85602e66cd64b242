use diesel::prelude::*;

use crate::core::unix_millis;
use crate::schema::*;
use crate::{DataResult, connect};

#[derive(Identifiable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct DbUser {
    pub id: i64,
    pub server_id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub password_pattern: Option<String>,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewDbUser {
    pub server_id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub password_pattern: Option<String>,
    pub created_at: i64,
}

impl NewDbUser {
    pub fn new(server_id: &str, user_id: &str, display_name: Option<String>, is_admin: bool) -> Self {
        Self {
            server_id: server_id.to_owned(),
            user_id: user_id.to_owned(),
            display_name,
            is_admin,
            password_pattern: None,
            created_at: unix_millis(),
        }
    }
}

#[derive(Identifiable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = tokens)]
pub struct DbToken {
    pub id: i64,
    pub server_id: String,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_ms: Option<i64>,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tokens)]
pub struct NewDbToken {
    pub server_id: String,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_ms: Option<i64>,
    pub created_at: i64,
}

#[derive(Identifiable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = passwords)]
pub struct DbPassword {
    pub id: i64,
    pub server_id: String,
    pub user_id: i64,
    pub password: String,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = passwords)]
pub struct NewDbPassword {
    pub server_id: String,
    pub user_id: i64,
    pub password: String,
    pub created_at: i64,
}

pub fn get_user(server_id: &str, user_id: &str) -> DataResult<Option<DbUser>> {
    users::table
        .filter(users::server_id.eq(server_id))
        .filter(users::user_id.eq(user_id))
        .first::<DbUser>(&mut connect()?)
        .optional()
        .map_err(Into::into)
}

pub fn create_user(new_user: &NewDbUser) -> DataResult<DbUser> {
    diesel::insert_into(users::table)
        .values(new_user)
        .get_result::<DbUser>(&mut connect()?)
        .map_err(Into::into)
}

pub fn list_users(server_id: &str) -> DataResult<Vec<DbUser>> {
    users::table
        .filter(users::server_id.eq(server_id))
        .order(users::id.asc())
        .load::<DbUser>(&mut connect()?)
        .map_err(Into::into)
}

/// The first admin of a tenant, if any.
pub fn find_admin(server_id: &str) -> DataResult<Option<DbUser>> {
    users::table
        .filter(users::server_id.eq(server_id))
        .filter(users::is_admin.eq(true))
        .order(users::id.asc())
        .first::<DbUser>(&mut connect()?)
        .optional()
        .map_err(Into::into)
}

pub fn set_password_pattern(id: i64, pattern: &str) -> DataResult<()> {
    diesel::update(users::table.find(id))
        .set(users::password_pattern.eq(pattern))
        .execute(&mut connect()?)?;
    Ok(())
}

pub fn get_token_for_user(user_id: i64) -> DataResult<Option<DbToken>> {
    tokens::table
        .filter(tokens::user_id.eq(user_id))
        .order(tokens::id.asc())
        .first::<DbToken>(&mut connect()?)
        .optional()
        .map_err(Into::into)
}

pub fn create_token(new_token: &NewDbToken) -> DataResult<DbToken> {
    diesel::insert_into(tokens::table)
        .values(new_token)
        .get_result::<DbToken>(&mut connect()?)
        .map_err(Into::into)
}

/// Whether the bearer token was issued by the tenant.
pub fn is_valid_access_token(server_id: &str, access_token: &str) -> DataResult<bool> {
    diesel::select(diesel::dsl::exists(
        tokens::table
            .filter(tokens::server_id.eq(server_id))
            .filter(tokens::access_token.eq(access_token)),
    ))
    .get_result::<bool>(&mut connect()?)
    .map_err(Into::into)
}

pub fn get_password_for_user(user_id: i64) -> DataResult<Option<DbPassword>> {
    passwords::table
        .filter(passwords::user_id.eq(user_id))
        .order(passwords::id.asc())
        .first::<DbPassword>(&mut connect()?)
        .optional()
        .map_err(Into::into)
}

pub fn create_password(new_password: &NewDbPassword) -> DataResult<DbPassword> {
    diesel::insert_into(passwords::table)
        .values(new_password)
        .get_result::<DbPassword>(&mut connect()?)
        .map_err(Into::into)
}
