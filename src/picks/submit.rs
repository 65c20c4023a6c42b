use axum::{
    Json,
    extract::{Path, Query},
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    categories::Nominee,
    picks::{
        Pick, has_completed_all_picks, picks_of_user_in_pool, upsert_pick,
    },
    pools::{add_member, find_global_pool, get_or_create_global_pool},
    ranking::orchestrate,
    schema::{nominees, picks},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, conflict, created,
        forbidden, ok,
    },
    users::User,
};

#[derive(Deserialize)]
pub struct UserIdParams {
    user_id: String,
}

/// The user's individual picks, i.e. their picks in the Global Pool.
pub async fn get_individual_picks(
    Query(params): Query<UserIdParams>,
    mut conn: Conn,
) -> StandardResponse {
    let Some(global) = find_global_pool(&mut *conn)? else {
        return ok(serde_json::json!({ "picks": [] }));
    };

    let body =
        picks_of_user_in_pool(&params.user_id, &global.id, &mut *conn)?;

    ok(serde_json::json!({ "picks": body }))
}

pub async fn get_picks_completed(
    Query(params): Query<UserIdParams>,
    mut conn: Conn,
) -> StandardResponse {
    let completed = match find_global_pool(&mut *conn)? {
        Some(global) => {
            has_completed_all_picks(&params.user_id, &global.id, &mut *conn)?
        }
        None => false,
    };

    ok(serde_json::json!({ "completed": completed }))
}

#[derive(Deserialize)]
pub struct PickEntry {
    category_id: String,
    nominee_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum SubmitPicksForm {
    Single {
        user_id: String,
        category_id: String,
        nominee_id: String,
    },
    Batch {
        user_id: String,
        picks: Vec<PickEntry>,
    },
}

/// Submits individual picks into the Global Pool, one request for a single
/// pick or a whole batch. Once the individual pick set is complete, fresh
/// submissions are rejected; changes go through the edit endpoint.
pub async fn do_submit_picks(
    mut conn: Conn,
    Json(form): Json<SubmitPicksForm>,
) -> StandardResponse {
    let (user_id, entries) = match form {
        SubmitPicksForm::Single {
            user_id,
            category_id,
            nominee_id,
        } => (
            user_id,
            vec![PickEntry {
                category_id,
                nominee_id,
            }],
        ),
        SubmitPicksForm::Batch { user_id, picks } => (user_id, picks),
    };

    if entries.is_empty() {
        return bad_request("no picks supplied");
    }
    for entry in &entries {
        if entry.category_id.is_empty() || entry.nominee_id.is_empty() {
            return bad_request("category_id and nominee_id are required");
        }
    }

    let user = User::fetch(&user_id, &mut *conn)?;
    let global = get_or_create_global_pool(&mut *conn)?;

    if has_completed_all_picks(&user.id, &global.id, &mut *conn)? {
        return conflict(
            "all picks already submitted; edit the existing picks instead",
        );
    }

    for entry in &entries {
        upsert_pick(
            &user.id,
            &global.id,
            &entry.category_id,
            &entry.nominee_id,
            &mut *conn,
        )?;
    }

    add_member(&global.id, &user.id, &mut *conn)?;

    orchestrate::refresh_after_pick_change(&user.id, &mut *conn);

    let body = picks_of_user_in_pool(&user.id, &global.id, &mut *conn)?;

    created(serde_json::json!({ "picks": body }))
}

#[derive(Deserialize)]
pub struct UpdatePickForm {
    user_id: String,
    nominee_id: String,
}

/// Replaces the nominee of one existing pick. Copies of the pick held in
/// group pools are frozen snapshots and are deliberately left untouched.
pub async fn do_update_pick(
    Path(pick_id): Path<String>,
    mut conn: Conn,
    Json(form): Json<UpdatePickForm>,
) -> StandardResponse {
    let pick = picks::table
        .filter(picks::id.eq(&pick_id))
        .first::<Pick>(&mut *conn)
        .optional()?
        .ok_or(FailureResponse::NotFound(()))?;

    if pick.user_id != form.user_id {
        return forbidden();
    }

    let nominee = nominees::table
        .filter(nominees::id.eq(&form.nominee_id))
        .first::<Nominee>(&mut *conn)
        .optional()?
        .ok_or(FailureResponse::NotFound(()))?;

    if nominee.category_id != pick.category_id {
        return bad_request("nominee does not belong to the pick's category");
    }

    let now = Utc::now().naive_utc();
    diesel::update(picks::table.filter(picks::id.eq(&pick.id)))
        .set((
            picks::nominee_id.eq(&nominee.id),
            picks::updated_at.eq(now),
        ))
        .execute(&mut *conn)?;

    orchestrate::refresh_after_pick_change(&pick.user_id, &mut *conn);

    ok(serde_json::json!({ "pick": Pick {
        nominee_id: nominee.id,
        updated_at: now,
        ..pick
    }}))
}
