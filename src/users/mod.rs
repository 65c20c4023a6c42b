use axum::{Json, extract::Path};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    schema::users,
    state::Conn,
    util_resp::{FailureResponse, StandardResponse, bad_request, created, ok},
    validation::is_valid_email,
};

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl User {
    pub fn fetch(
        user_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<User, FailureResponse> {
        users::table
            .filter(users::id.eq(user_id))
            .first::<User>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }
}

#[derive(Deserialize)]
pub struct UpsertUserForm {
    name: String,
    email: String,
    city: Option<String>,
    state: Option<String>,
}

/// Inserts a user record, or updates the profile fields of the existing
/// record with the same email.
pub async fn do_upsert_user(
    mut conn: Conn,
    Json(form): Json<UpsertUserForm>,
) -> StandardResponse {
    if form.name.trim().is_empty() {
        return bad_request("name is required");
    }
    if let Err(e) = is_valid_email(&form.email) {
        return bad_request(e);
    }

    let now = Utc::now().naive_utc();

    let existing = users::table
        .filter(users::email.eq(&form.email))
        .first::<User>(&mut *conn)
        .optional()?;

    let user = match existing {
        Some(user) => {
            diesel::update(users::table.filter(users::id.eq(&user.id)))
                .set((
                    users::name.eq(&form.name),
                    users::city.eq(form.city.clone()),
                    users::state.eq(form.state.clone()),
                    users::updated_at.eq(now),
                ))
                .execute(&mut *conn)?;

            return ok(serde_json::json!({ "user": User {
                name: form.name,
                city: form.city,
                state: form.state,
                updated_at: now,
                ..user
            }}));
        }
        None => {
            let user = User {
                id: Uuid::now_v7().to_string(),
                name: form.name,
                email: form.email,
                city: form.city,
                state: form.state,
                created_at: now,
                updated_at: now,
            };

            diesel::insert_into(users::table)
                .values((
                    users::id.eq(&user.id),
                    users::name.eq(&user.name),
                    users::email.eq(&user.email),
                    users::city.eq(user.city.clone()),
                    users::state.eq(user.state.clone()),
                    users::created_at.eq(user.created_at),
                    users::updated_at.eq(user.updated_at),
                ))
                .execute(&mut *conn)?;

            user
        }
    };

    created(serde_json::json!({ "user": user }))
}

pub async fn get_user(
    Path(user_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let user = User::fetch(&user_id, &mut *conn)?;

    ok(serde_json::json!({ "user": user }))
}
