use axum::Json;
use serde::Deserialize;

use crate::{
    picks::copy_picks,
    pools::{
        add_member, find_by_invite_code, get_or_create_global_pool,
        is_participant,
    },
    ranking::orchestrate,
    state::Conn,
    util_resp::{StandardResponse, conflict, err_not_found, ok},
    users::User,
};

#[derive(Deserialize)]
pub struct JoinPoolForm {
    invite_code: String,
    user_id: String,
}

/// Joins a group pool by invite code, snapshotting the joiner's individual
/// picks into it. An unknown code fails with 404 before any write happens;
/// joining a pool the user already belongs to is a conflict.
pub async fn do_join_pool(
    mut conn: Conn,
    Json(form): Json<JoinPoolForm>,
) -> StandardResponse {
    let user = User::fetch(&form.user_id, &mut *conn)?;

    let Some(pool) = find_by_invite_code(&form.invite_code, &mut *conn)?
    else {
        return err_not_found();
    };

    if is_participant(&pool, &user.id, &mut *conn)? {
        return conflict("you already take part in this pool");
    }

    let global = get_or_create_global_pool(&mut *conn)?;

    add_member(&pool.id, &user.id, &mut *conn)?;

    let copied = copy_picks(&user.id, &global.id, &pool.id, &mut *conn)?;
    tracing::info!(
        pool_id = %pool.id,
        user_id = %user.id,
        copied,
        "user joined group pool"
    );

    orchestrate::refresh_after_group_change(&pool, &mut *conn);

    ok(serde_json::json!({ "pool": pool }))
}
