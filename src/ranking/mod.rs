use axum::extract::{Path, Query};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    pools::{Pool, find_global_pool, pools_of_user},
    schema::{rankings, users},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, ok,
    },
};

pub mod compute;
pub mod orchestrate;

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct RankingEntry {
    pub id: String,
    pub pool_id: String,
    pub user_id: String,
    pub points: i64,
    pub position: i64,
    pub updated_at: chrono::NaiveDateTime,
}

/// Ranking rows of a pool in listing order, each joined with a small user
/// payload.
pub fn pool_ranking(
    pool_id: &str,
    limit: Option<i64>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<serde_json::Value>> {
    let mut query = rankings::table
        .inner_join(users::table)
        .filter(rankings::pool_id.eq(pool_id))
        .order_by((rankings::position.asc(), rankings::id.asc()))
        .select((
            rankings::all_columns,
            (users::name, users::city, users::state),
        ))
        .into_boxed::<Sqlite>();

    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let rows = query.load::<(
        RankingEntry,
        (String, Option<String>, Option<String>),
    )>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(entry, (name, city, state))| {
            serde_json::json!({
                "id": entry.id,
                "pool_id": entry.pool_id,
                "user_id": entry.user_id,
                "points": entry.points,
                "position": entry.position,
                "updated_at": entry.updated_at,
                "user": { "name": name, "city": city, "state": state },
            })
        })
        .collect())
}

pub fn user_entry(
    pool_id: &str,
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Option<RankingEntry>> {
    rankings::table
        .filter(
            rankings::pool_id
                .eq(pool_id)
                .and(rankings::user_id.eq(user_id)),
        )
        .first::<RankingEntry>(conn)
        .optional()
}

#[derive(Deserialize)]
pub struct LimitParams {
    limit: Option<i64>,
}

const DEFAULT_GLOBAL_LIMIT: i64 = 100;

pub async fn get_global_ranking(
    Query(params): Query<LimitParams>,
    mut conn: Conn,
) -> StandardResponse {
    let Some(global) = find_global_pool(&mut *conn)? else {
        return ok(serde_json::json!({ "ranking": [] }));
    };

    let limit = params.limit.unwrap_or(DEFAULT_GLOBAL_LIMIT);
    let body = pool_ranking(&global.id, Some(limit), &mut *conn)?;

    ok(serde_json::json!({ "ranking": body }))
}

pub async fn get_pool_ranking(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;
    let body = pool_ranking(&pool.id, None, &mut *conn)?;

    ok(serde_json::json!({ "ranking": body }))
}

pub async fn get_user_position(
    Path((pool_id, user_id)): Path<(String, String)>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    let entry = user_entry(&pool.id, &user_id, &mut *conn)?
        .ok_or(FailureResponse::NotFound(()))?;

    ok(serde_json::json!({ "entry": entry }))
}

/// Where the group stands in the global ranking, represented by its
/// current #1 member. `null` while the group has no ranked member or the
/// representative has no global entry yet.
pub async fn get_group_global_position(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    if !pool.is_group() {
        return bad_request("only group pools have a global position");
    }

    let position =
        orchestrate::group_position_in_global(&pool, &mut *conn)?;

    ok(serde_json::json!({ "global_position": position }))
}

pub async fn get_pool_stats(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    let points = rankings::table
        .filter(rankings::pool_id.eq(&pool.id))
        .select(rankings::points)
        .load::<i64>(&mut *conn)?;

    let total = points.len() as i64;
    let sum: i64 = points.iter().sum();
    let average = if total > 0 {
        (sum as f64 / total as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    ok(serde_json::json!({
        "total_participants": total,
        "average_points": average,
        "max_points": points.iter().max().copied().unwrap_or(0),
        "min_points": points.iter().min().copied().unwrap_or(0),
    }))
}

#[derive(Deserialize)]
pub struct UserIdParams {
    user_id: String,
}

/// The user's position in the global ranking plus, for each of their
/// group pools, their position inside the group and the group's standing
/// in the global ranking.
pub async fn get_ranking_summary(
    Query(params): Query<UserIdParams>,
    mut conn: Conn,
) -> StandardResponse {
    let global_entry = match find_global_pool(&mut *conn)? {
        Some(global) => user_entry(&global.id, &params.user_id, &mut *conn)?,
        None => None,
    };

    let mut groups = Vec::new();
    for pool in pools_of_user(&params.user_id, &mut *conn)? {
        if !pool.is_group() {
            continue;
        }

        let in_group = user_entry(&pool.id, &params.user_id, &mut *conn)?;
        let group_in_global =
            orchestrate::group_position_in_global(&pool, &mut *conn)?;

        groups.push(serde_json::json!({
            "pool": pool,
            "position_in_group": in_group,
            "group_position_in_global": group_in_global,
        }));
    }

    ok(serde_json::json!({
        "global": global_entry,
        "groups": groups,
    }))
}

/// Explicit recalculation of one pool; group pools cascade into the
/// global pass. Unlike the event-driven refreshes this surfaces failures.
pub async fn do_recalculate_pool(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    orchestrate::refresh_pool_strict(&pool, &mut *conn)?;

    ok(serde_json::json!({ "recalculated": true }))
}

pub async fn do_recalculate_all(mut conn: Conn) -> StandardResponse {
    orchestrate::refresh_all_strict(&mut *conn)?;

    ok(serde_json::json!({ "recalculated": true }))
}
