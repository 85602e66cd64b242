use salvo::http::header::HOST;
use salvo::http::{Method, StatusCode};
use salvo::prelude::*;
use serde::Serialize;

use crate::backoffice::{self, AdminCredentials, CreatedBatch, RoomWithMembers, UserInfo};
use crate::core::JsonObject;
use crate::core::method::check_method;
use crate::{AppResult, JsonResult, MatrixError, hoops, json_ok, state};

#[derive(Serialize, Debug)]
pub struct ResetResBody {
    pub reset: bool,
}

#[derive(Serialize, Debug)]
pub struct UsersResBody {
    pub users: Vec<UserInfo>,
}

#[derive(Serialize, Debug)]
pub struct RoomsResBody {
    pub rooms: Vec<RoomWithMembers>,
}

pub fn root() -> Router {
    Router::new()
        .push(Router::with_path("health").get(health))
        .push(
            Router::with_path("{server_id}/backoffice")
                .push(Router::with_path("create-admin").goal(create_admin))
                .push(
                    Router::new()
                        .hoop(hoops::auth_by_access_token)
                        .push(Router::with_path("reset").goal(reset))
                        .push(Router::with_path("rooms").goal(list_rooms))
                        .push(Router::with_path("users").goal(list_users))
                        .push(Router::with_path("create").goal(create)),
                ),
        )
}

#[handler]
async fn health() -> &'static str {
    "OK"
}

/// POST `/{server_id}/backoffice/create-admin`
///
/// Not behind the auth hoop: this is how the first access token of a tenant
/// comes to exist.
#[handler]
pub async fn create_admin(req: &mut Request) -> JsonResult<AdminCredentials> {
    check_method(&[Method::POST], req.method())
        .map_err(|e| e.with_status(StatusCode::FORBIDDEN))?;
    let server_id = server_id(req)?;
    let state = state()?;
    json_ok(backoffice::create_admin(
        state.store.as_ref(),
        &server_id,
        &state.admin,
    )?)
}

/// POST or DELETE `/{server_id}/backoffice/reset`
#[handler]
pub async fn reset(req: &mut Request) -> JsonResult<ResetResBody> {
    check_method(&[Method::POST, Method::DELETE], req.method())?;
    let server_id = server_id(req)?;
    backoffice::reset(state()?.store.as_ref(), &server_id)?;
    json_ok(ResetResBody { reset: true })
}

/// GET `/{server_id}/backoffice/rooms`
#[handler]
pub async fn list_rooms(req: &mut Request) -> JsonResult<RoomsResBody> {
    check_method(&[Method::GET], req.method())?;
    let server_id = server_id(req)?;
    let rooms = backoffice::list_rooms(state()?.store.as_ref(), &server_id)?;
    json_ok(RoomsResBody { rooms })
}

/// GET `/{server_id}/backoffice/users`
#[handler]
pub async fn list_users(req: &mut Request) -> JsonResult<UsersResBody> {
    check_method(&[Method::GET], req.method())?;
    let server_id = server_id(req)?;
    let users = backoffice::list_users(state()?.store.as_ref(), &server_id)?;
    json_ok(UsersResBody { users })
}

/// PUT `/{server_id}/backoffice/create`
#[handler]
pub async fn create(req: &mut Request) -> JsonResult<CreatedBatch> {
    check_method(&[Method::PUT], req.method())?;
    let server_id = server_id(req)?;
    let host = request_host(req);
    let payload = req
        .parse_json::<JsonObject>()
        .await
        .map_err(|e| MatrixError::bad_json(e.to_string()))?;
    json_ok(backoffice::create_batch(
        state()?.store.as_ref(),
        &server_id,
        &host,
        &payload,
    )?)
}

pub(crate) fn server_id(req: &Request) -> AppResult<String> {
    req.param::<String>("server_id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| MatrixError::not_found("Missing server id").into())
}

/// Host name the request was addressed to, without the port.
fn request_host(req: &Request) -> String {
    let host = req
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or("localhost");
    strip_port(host).to_owned()
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::strip_port;

    #[test]
    fn port_is_removed_from_host() {
        assert_eq!(strip_port("example.org:8448"), "example.org");
        assert_eq!(strip_port("example.org"), "example.org");
        assert_eq!(strip_port("[::1]:8008"), "[::1]");
        assert_eq!(strip_port("::1"), "::1");
    }
}
