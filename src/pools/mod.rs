use axum::extract::{Path, Query};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ranking::orchestrate,
    schema::{picks, pool_members, pools, rankings, users},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, forbidden, ok,
    },
};

pub mod create;
pub mod invite;
pub mod join;

/// Name of the single individual pool every submitted pick lands in.
pub const GLOBAL_POOL_NAME: &str = "Global Ranking";

pub const KIND_INDIVIDUAL: &str = "individual";
pub const KIND_GROUP: &str = "group";

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub invite_code: Option<String>,
    pub creator_id: String,
    pub created_at: chrono::NaiveDateTime,
}

impl Pool {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        pool_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Pool, FailureResponse> {
        pools::table
            .filter(pools::id.eq(pool_id))
            .first::<Pool>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn is_group(&self) -> bool {
        self.kind == KIND_GROUP
    }
}

#[derive(Debug, Queryable, Serialize, Clone)]
pub struct PoolMember {
    pub id: String,
    pub pool_id: String,
    pub user_id: String,
    pub joined_at: chrono::NaiveDateTime,
}

/// Returns the Global Pool without creating it. Absence is a legitimate
/// empty-system state.
pub fn find_global_pool(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Option<Pool>> {
    pools::table
        .filter(
            pools::name
                .eq(GLOBAL_POOL_NAME)
                .and(pools::kind.eq(KIND_INDIVIDUAL)),
        )
        .first::<Pool>(conn)
        .optional()
}

/// Returns the Global Pool, creating it if absent. The earliest-registered
/// user serves as nominal creator; with no users at all the system is in a
/// degenerate state and the caller gets a 500.
pub fn get_or_create_global_pool(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Pool, FailureResponse> {
    if let Some(pool) = find_global_pool(conn)? {
        return Ok(pool);
    }

    let creator = users::table
        .order_by(users::created_at.asc())
        .select(users::id)
        .first::<String>(conn)
        .optional()?;

    let Some(creator_id) = creator else {
        tracing::warn!("global pool requested but no users exist");
        return Err(FailureResponse::ServerError(
            "no users available to create the global pool".to_string(),
        ));
    };

    let pool = Pool {
        id: Uuid::now_v7().to_string(),
        name: GLOBAL_POOL_NAME.to_string(),
        kind: KIND_INDIVIDUAL.to_string(),
        invite_code: None,
        creator_id,
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(pools::table)
        .values((
            pools::id.eq(&pool.id),
            pools::name.eq(&pool.name),
            pools::kind.eq(&pool.kind),
            pools::invite_code.eq(None::<String>),
            pools::creator_id.eq(&pool.creator_id),
            pools::created_at.eq(pool.created_at),
        ))
        .execute(conn)?;

    tracing::info!(pool_id = %pool.id, "created global pool");

    Ok(pool)
}

/// Idempotent membership insert: joining a pool twice returns the existing
/// row rather than erroring.
pub fn add_member(
    pool_id: &str,
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<PoolMember> {
    let existing = pool_members::table
        .filter(
            pool_members::pool_id
                .eq(pool_id)
                .and(pool_members::user_id.eq(user_id)),
        )
        .first::<PoolMember>(conn)
        .optional()?;

    if let Some(member) = existing {
        return Ok(member);
    }

    let member = PoolMember {
        id: Uuid::now_v7().to_string(),
        pool_id: pool_id.to_string(),
        user_id: user_id.to_string(),
        joined_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(pool_members::table)
        .values((
            pool_members::id.eq(&member.id),
            pool_members::pool_id.eq(&member.pool_id),
            pool_members::user_id.eq(&member.user_id),
            pool_members::joined_at.eq(member.joined_at),
        ))
        .execute(conn)?;

    Ok(member)
}

/// A pool's creator counts as a participant even without a membership row.
pub fn is_participant(
    pool: &Pool,
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    if pool.creator_id == user_id {
        return Ok(true);
    }

    diesel::select(diesel::dsl::exists(
        pool_members::table.filter(
            pool_members::pool_id
                .eq(&pool.id)
                .and(pool_members::user_id.eq(user_id)),
        ),
    ))
    .get_result::<bool>(conn)
}

/// Distinct participant ids of a pool: the creator plus every member.
pub fn participant_ids(
    pool: &Pool,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<String>> {
    let mut ids = pool_members::table
        .filter(pool_members::pool_id.eq(&pool.id))
        .select(pool_members::user_id)
        .load::<String>(conn)?;

    if !ids.contains(&pool.creator_id) {
        ids.push(pool.creator_id.clone());
    }

    Ok(ids)
}

pub fn find_by_invite_code(
    code: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Option<Pool>> {
    pools::table
        .filter(pools::invite_code.eq(code))
        .first::<Pool>(conn)
        .optional()
}

/// Every pool the user holds a membership row in.
pub fn pools_of_user(
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<Pool>> {
    pool_members::table
        .inner_join(pools::table)
        .filter(pool_members::user_id.eq(user_id))
        .select((
            pools::id,
            pools::name,
            pools::kind,
            pools::invite_code,
            pools::creator_id,
            pools::created_at,
        ))
        .load::<Pool>(conn)
}

#[derive(Deserialize)]
pub struct UserIdParams {
    user_id: String,
}

pub async fn get_global_pool(mut conn: Conn) -> StandardResponse {
    let pool = get_or_create_global_pool(&mut *conn)?;

    ok(serde_json::json!({ "pool": pool }))
}

pub async fn list_user_pools(
    Query(params): Query<UserIdParams>,
    mut conn: Conn,
) -> StandardResponse {
    let pools = pools_of_user(&params.user_id, &mut *conn)?;

    ok(serde_json::json!({ "pools": pools }))
}

pub async fn get_pool(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    ok(serde_json::json!({ "pool": pool }))
}

pub async fn list_participants(
    Path(pool_id): Path<String>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    let members = pool_members::table
        .inner_join(users::table)
        .filter(pool_members::pool_id.eq(&pool.id))
        .order_by(pool_members::joined_at.asc())
        .select((
            (
                pool_members::id,
                pool_members::pool_id,
                pool_members::user_id,
                pool_members::joined_at,
            ),
            (users::name, users::email, users::city, users::state),
        ))
        .load::<(
            PoolMember,
            (String, String, Option<String>, Option<String>),
        )>(&mut *conn)?;

    let body = members
        .into_iter()
        .map(|(member, (name, email, city, state))| {
            serde_json::json!({
                "id": member.id,
                "pool_id": member.pool_id,
                "user_id": member.user_id,
                "joined_at": member.joined_at,
                "user": {
                    "name": name,
                    "email": email,
                    "city": city,
                    "state": state,
                },
            })
        })
        .collect::<Vec<_>>();

    ok(serde_json::json!({ "participants": body }))
}

/// Hard delete of a pool and everything hanging off it. Creator-only.
pub async fn do_delete_pool(
    Path(pool_id): Path<String>,
    Query(params): Query<UserIdParams>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    if pool.creator_id != params.user_id {
        return forbidden();
    }
    if !pool.is_group() {
        return bad_request("the global pool cannot be deleted");
    }

    diesel::delete(rankings::table.filter(rankings::pool_id.eq(&pool.id)))
        .execute(&mut *conn)?;
    diesel::delete(picks::table.filter(picks::pool_id.eq(&pool.id)))
        .execute(&mut *conn)?;
    diesel::delete(
        pool_members::table.filter(pool_members::pool_id.eq(&pool.id)),
    )
    .execute(&mut *conn)?;
    diesel::delete(pools::table.filter(pools::id.eq(&pool.id)))
        .execute(&mut *conn)?;

    ok(serde_json::json!({ "deleted": true }))
}

/// Removes a member from a pool. Their picks stay behind as inert rows;
/// the recompute excludes non-participants, so their ranking entry
/// disappears on the next pass.
pub async fn do_remove_member(
    Path((pool_id, user_id)): Path<(String, String)>,
    mut conn: Conn,
) -> StandardResponse {
    let pool = Pool::fetch(&pool_id, &mut *conn)?;

    let n = diesel::delete(
        pool_members::table.filter(
            pool_members::pool_id
                .eq(&pool.id)
                .and(pool_members::user_id.eq(&user_id)),
        ),
    )
    .execute(&mut *conn)?;

    if n == 0 {
        return Err(FailureResponse::NotFound(()));
    }

    if pool.is_group() {
        orchestrate::refresh_after_group_change(&pool, &mut *conn);
    } else {
        orchestrate::refresh_global(&mut *conn);
    }

    ok(serde_json::json!({ "removed": true }))
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use super::{
        GLOBAL_POOL_NAME, add_member, find_by_invite_code,
        get_or_create_global_pool, invite::get_unique_invite_code,
        is_participant, participant_ids,
    };
    use crate::{
        schema::pool_members,
        test::{insert_group_pool, insert_user, setup_conn},
        util_resp::FailureResponse,
        validation::is_valid_invite_code,
    };

    #[test]
    fn add_member_is_idempotent() {
        let mut conn = setup_conn();

        let ana = insert_user(&mut conn, "ana");
        let bruno = insert_user(&mut conn, "bruno");
        let group = insert_group_pool(&mut conn, "Movie Night", &ana);

        let first = add_member(&group, &bruno, &mut conn).unwrap();
        let second = add_member(&group, &bruno, &mut conn).unwrap();

        assert_eq!(first.id, second.id);

        let rows = pool_members::table
            .filter(
                pool_members::pool_id
                    .eq(&group)
                    .and(pool_members::user_id.eq(&bruno)),
            )
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn creator_counts_as_participant_without_a_membership_row() {
        let mut conn = setup_conn();

        let ana = insert_user(&mut conn, "ana");
        let bruno = insert_user(&mut conn, "bruno");

        // The lazily-created global pool has a creator but no membership
        // rows at all.
        let global = get_or_create_global_pool(&mut conn).unwrap();
        assert_eq!(global.creator_id, ana);

        assert!(is_participant(&global, &ana, &mut conn).unwrap());
        assert!(!is_participant(&global, &bruno, &mut conn).unwrap());

        let ids = participant_ids(&global, &mut conn).unwrap();
        assert_eq!(ids, vec![ana.clone()]);

        // Adding a membership row for the creator must not double-count.
        add_member(&global.id, &ana, &mut conn).unwrap();
        assert_eq!(participant_ids(&global, &mut conn).unwrap().len(), 1);
    }

    #[test]
    fn global_pool_needs_a_user_and_is_created_once() {
        let mut conn = setup_conn();

        match get_or_create_global_pool(&mut conn) {
            Err(FailureResponse::ServerError(_)) => {}
            other => panic!("expected a server error, got {other:?}"),
        }

        insert_user(&mut conn, "ana");

        let first = get_or_create_global_pool(&mut conn).unwrap();
        assert_eq!(first.name, GLOBAL_POOL_NAME);
        assert_eq!(first.invite_code, None);

        let second = get_or_create_global_pool(&mut conn).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn absent_invite_code_is_a_sentinel_not_an_error() {
        let mut conn = setup_conn();

        assert!(
            find_by_invite_code("ABC123", &mut conn).unwrap().is_none()
        );
    }

    #[test]
    fn generated_invite_codes_are_well_formed() {
        let mut conn = setup_conn();

        let code = get_unique_invite_code(&mut conn).unwrap();
        assert!(is_valid_invite_code(&code).is_ok());
    }
}
