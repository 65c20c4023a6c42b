//! Sequencing of scoring passes after mutating events.
//!
//! Ranking freshness is handled synchronously: a mutation leaves the
//! affected pools stale, and the entry points here recompute them before
//! the triggering request returns. There is no background queue and no
//! retry; a failed pass leaves the previous rows in place (the engine is
//! transactional), gets logged, and is healed by the next event. The
//! user-visible action that triggered the pass still succeeds.

use diesel::{
    Connection, connection::LoadConnection, prelude::*, sqlite::Sqlite,
};
use serde::Serialize;

use crate::{
    pools::{KIND_GROUP, Pool, find_global_pool, pools_of_user},
    ranking::{RankingEntry, compute::compute_and_persist},
    schema::{pools, rankings, users},
    util_resp::FailureResponse,
};

fn best_effort(label: &str, result: QueryResult<usize>) {
    match result {
        Ok(rows) => {
            tracing::debug!(rows, "{label} ranking recomputed");
        }
        Err(err) => {
            tracing::error!(?err, "{label} ranking recompute failed");
        }
    }
}

/// Recomputes the Global Pool if it exists yet. Best-effort.
pub fn refresh_global(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) {
    match find_global_pool(conn) {
        Ok(Some(global)) => {
            best_effort("global", compute_and_persist(&global, conn));
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(?err, "global pool lookup failed");
        }
    }
}

/// Recomputes a group pool and THEN the Global Pool, in that order.
///
/// Precondition: `pool` is a group pool. The ordering is load-bearing:
/// a group's standing in the global ranking is derived through its
/// current #1 member, so the group's own scoring must be settled before
/// the global rows are rewritten and read.
pub fn refresh_after_group_change(
    pool: &Pool,
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) {
    debug_assert!(pool.is_group());

    best_effort("group", compute_and_persist(pool, conn));
    refresh_global(conn);
}

/// After a pick is created or edited: the Global Pool first, then every
/// group pool the user belongs to.
pub fn refresh_after_pick_change(
    user_id: &str,
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) {
    refresh_global(conn);

    match pools_of_user(user_id, conn) {
        Ok(user_pools) => {
            for pool in user_pools.iter().filter(|p| p.is_group()) {
                best_effort("group", compute_and_persist(pool, conn));
            }
        }
        Err(err) => {
            tracing::error!(?err, "pool fan-out lookup failed");
        }
    }
}

fn upstream(err: diesel::result::Error) -> FailureResponse {
    tracing::error!(?err, "scoring pass failed");
    FailureResponse::ServerError("ranking recompute failed".to_string())
}

/// Strict single-pool refresh for the explicit recalculation endpoint:
/// group pools cascade into the global pass, failures surface to the
/// caller.
pub fn refresh_pool_strict(
    pool: &Pool,
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<(), FailureResponse> {
    if pool.is_group() {
        compute_and_persist(pool, conn).map_err(upstream)?;
    }

    if let Some(global) = find_global_pool(conn)? {
        compute_and_persist(&global, conn).map_err(upstream)?;
    }

    Ok(())
}

/// Recomputes every group pool, then the Global Pool. Used after a
/// category winner is declared.
pub fn refresh_all_strict(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<(), FailureResponse> {
    let groups = pools::table
        .filter(pools::kind.eq(KIND_GROUP))
        .load::<Pool>(conn)?;

    for group in &groups {
        compute_and_persist(group, conn).map_err(upstream)?;
    }

    if let Some(global) = find_global_pool(conn)? {
        compute_and_persist(&global, conn).map_err(upstream)?;
    }

    Ok(())
}

/// Best-effort variant of [`refresh_all_strict`] for event paths where
/// the user action must not fail on a scoring error.
pub fn refresh_all(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) {
    if let Err(err) = refresh_all_strict(conn) {
        tracing::error!(?err, "full ranking refresh failed");
    }
}

#[derive(Debug, Serialize)]
pub struct GroupGlobalPosition {
    pub position: i64,
    pub points: i64,
    pub user_id: String,
    pub representative: String,
}

/// A group's standing in the global ranking, derived at read time: the
/// group's current #1 member joined against that member's Global Pool
/// entry. `None` when the group has no ranked member yet, or its #1 has
/// no global entry. This is never stored — it always reflects the latest
/// persisted ranking rows of both pools.
pub fn group_position_in_global(
    pool: &Pool,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Option<GroupGlobalPosition>> {
    let top = rankings::table
        .inner_join(users::table)
        .filter(rankings::pool_id.eq(&pool.id))
        .order_by((rankings::position.asc(), rankings::id.asc()))
        .select((rankings::all_columns, users::name))
        .first::<(RankingEntry, String)>(conn)
        .optional()?;

    let Some((top_entry, representative)) = top else {
        return Ok(None);
    };

    let Some(global) = find_global_pool(conn)? else {
        return Ok(None);
    };

    let entry = rankings::table
        .filter(
            rankings::pool_id
                .eq(&global.id)
                .and(rankings::user_id.eq(&top_entry.user_id)),
        )
        .first::<RankingEntry>(conn)
        .optional()?;

    Ok(entry.map(|entry| GroupGlobalPosition {
        position: entry.position,
        points: entry.points,
        user_id: entry.user_id,
        representative,
    }))
}

#[cfg(test)]
mod tests {
    use super::group_position_in_global;
    use crate::{
        picks::upsert_pick,
        pools::{Pool, add_member, get_or_create_global_pool},
        ranking::compute::compute_and_persist,
        schema::pools,
        test::{
            insert_category, insert_group_pool, insert_nominee,
            insert_user, set_winner, setup_conn,
        },
    };
    use diesel::prelude::*;

    #[test]
    fn group_without_ranking_rows_has_no_global_position() {
        let mut conn = setup_conn();

        let ana = insert_user(&mut conn, "ana");
        let group_id = insert_group_pool(&mut conn, "Movie Night", &ana);
        let group = pools::table
            .filter(pools::id.eq(&group_id))
            .first::<Pool>(&mut conn)
            .unwrap();

        assert!(
            group_position_in_global(&group, &mut conn)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn group_is_represented_by_its_number_one() {
        let mut conn = setup_conn();

        let ana = insert_user(&mut conn, "ana");
        let bruno = insert_user(&mut conn, "bruno");

        let cat1 = insert_category(&mut conn, "Best Picture", 1);
        let cat2 = insert_category(&mut conn, "Best Director", 2);
        let win1 = insert_nominee(&mut conn, &cat1, "Winner One");
        let win2 = insert_nominee(&mut conn, &cat2, "Winner Two");
        let lose1 = insert_nominee(&mut conn, &cat1, "Loser One");

        let global = get_or_create_global_pool(&mut conn).unwrap();
        let group_id = insert_group_pool(&mut conn, "Movie Night", &ana);
        add_member(&global.id, &ana, &mut conn).unwrap();
        add_member(&global.id, &bruno, &mut conn).unwrap();
        add_member(&group_id, &bruno, &mut conn).unwrap();

        // Bruno calls both categories, Ana only the second; the same
        // picks live in the global pool and the group snapshot.
        for pool_id in [&global.id, &group_id] {
            upsert_pick(&bruno, pool_id, &cat1, &win1, &mut conn)
                .unwrap();
            upsert_pick(&bruno, pool_id, &cat2, &win2, &mut conn)
                .unwrap();
            upsert_pick(&ana, pool_id, &cat1, &lose1, &mut conn)
                .unwrap();
            upsert_pick(&ana, pool_id, &cat2, &win2, &mut conn)
                .unwrap();
        }

        set_winner(&mut conn, &win1);
        set_winner(&mut conn, &win2);

        let group = pools::table
            .filter(pools::id.eq(&group_id))
            .first::<Pool>(&mut conn)
            .unwrap();

        // Group first, then global.
        compute_and_persist(&group, &mut conn).unwrap();
        compute_and_persist(&global, &mut conn).unwrap();

        let pos = group_position_in_global(&group, &mut conn)
            .unwrap()
            .unwrap();

        // Bruno (2 points) leads the group, so the group's entry in the
        // global ranking is his.
        assert_eq!(pos.user_id, bruno);
        assert_eq!(pos.points, 2);
        assert_eq!(pos.position, 1);
        assert_eq!(pos.representative, "bruno");
    }
}
