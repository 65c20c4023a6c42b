use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    picks::copy_picks,
    pools::{
        KIND_GROUP, Pool, add_member, get_or_create_global_pool,
        invite::get_unique_invite_code,
    },
    ranking::orchestrate,
    schema::pools,
    state::Conn,
    util_resp::{StandardResponse, bad_request, created},
    users::User,
    validation::is_valid_pool_name,
};

#[derive(Deserialize)]
pub struct CreateGroupPoolForm {
    name: String,
    user_id: String,
}

/// Creates a group pool: generates a unique invite code, adds the creator
/// as a member and snapshots their individual picks into the new pool.
/// The whole sequence runs inside the request transaction, so a failure
/// partway through leaves nothing behind.
pub async fn do_create_group_pool(
    mut conn: Conn,
    Json(form): Json<CreateGroupPoolForm>,
) -> StandardResponse {
    if let Err(e) = is_valid_pool_name(&form.name) {
        return bad_request(e);
    }

    let creator = User::fetch(&form.user_id, &mut *conn)?;
    let global = get_or_create_global_pool(&mut *conn)?;

    let invite_code = get_unique_invite_code(&mut *conn)?;

    let pool = Pool {
        id: Uuid::now_v7().to_string(),
        name: form.name.trim().to_string(),
        kind: KIND_GROUP.to_string(),
        invite_code: Some(invite_code.clone()),
        creator_id: creator.id.clone(),
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(pools::table)
        .values((
            pools::id.eq(&pool.id),
            pools::name.eq(&pool.name),
            pools::kind.eq(&pool.kind),
            pools::invite_code.eq(pool.invite_code.clone()),
            pools::creator_id.eq(&pool.creator_id),
            pools::created_at.eq(pool.created_at),
        ))
        .execute(&mut *conn)?;

    add_member(&pool.id, &creator.id, &mut *conn)?;

    let copied = copy_picks(&creator.id, &global.id, &pool.id, &mut *conn)?;
    tracing::info!(
        pool_id = %pool.id,
        copied,
        "created group pool and snapshotted creator picks"
    );

    orchestrate::refresh_after_group_change(&pool, &mut *conn);

    created(serde_json::json!({
        "pool": pool,
        "invite_code": invite_code,
    }))
}
