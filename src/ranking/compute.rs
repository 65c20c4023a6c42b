use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, Utc};
use diesel::{
    Connection, connection::LoadConnection, prelude::*, sqlite::Sqlite,
};
use uuid::Uuid;

use crate::{
    categories::declared_winners,
    picks::Pick,
    pools::{Pool, participant_ids},
    schema::{picks, rankings},
};

/// One scoring pass over a pool: every participant's point total is
/// recomputed from their picks against the declared winners, dense
/// positions are assigned, and the pool's ranking rows are replaced
/// wholesale. Never patches individual rows.
///
/// A point is scored for each pick whose nominee is its category's
/// declared winner; categories without a winner contribute nothing to
/// anyone. Equal point totals share a position; within a position, rows
/// are ordered by earliest pick-set completion (the latest `created_at`
/// among the member's picks, unmoved by edits), then by user id.
///
/// The pass runs in its own (nested) transaction: if it fails, the
/// previous ranking rows are left fully intact.
#[tracing::instrument(skip_all, fields(pool_id = %pool.id))]
pub fn compute_and_persist(
    pool: &Pool,
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> QueryResult<usize> {
    conn.transaction(|conn| {
        let participants = participant_ids(pool, conn)?;
        let winners = declared_winners(conn)?;

        let pool_picks = picks::table
            .filter(picks::pool_id.eq(&pool.id))
            .load::<Pick>(conn)?;

        let mut points: HashMap<String, i64> = HashMap::new();
        let mut completed_at: HashMap<String, NaiveDateTime> =
            HashMap::new();

        {
            let member_set: HashSet<&String> = participants.iter().collect();

            for pick in &pool_picks {
                // Picks left behind by departed members stay in the table
                // but never score.
                if !member_set.contains(&pick.user_id) {
                    continue;
                }

                if winners.get(&pick.category_id)
                    == Some(&pick.nominee_id)
                {
                    *points.entry(pick.user_id.clone()).or_insert(0) += 1;
                }

                completed_at
                    .entry(pick.user_id.clone())
                    .and_modify(|t| *t = (*t).max(pick.created_at))
                    .or_insert(pick.created_at);
            }
        }

        let mut rows: Vec<(String, i64, NaiveDateTime)> = participants
            .into_iter()
            .map(|user_id| {
                let pts = points.get(&user_id).copied().unwrap_or(0);
                let done = completed_at
                    .get(&user_id)
                    .copied()
                    .unwrap_or(NaiveDateTime::MAX);
                (user_id, pts, done)
            })
            .collect();

        rows.sort_by(|a, b| {
            b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0))
        });

        diesel::delete(
            rankings::table.filter(rankings::pool_id.eq(&pool.id)),
        )
        .execute(conn)?;

        let now = Utc::now().naive_utc();
        let mut position = 0i64;
        let mut prev_points = None;

        for (user_id, pts, _) in &rows {
            if prev_points != Some(*pts) {
                position += 1;
                prev_points = Some(*pts);
            }

            diesel::insert_into(rankings::table)
                .values((
                    rankings::id.eq(Uuid::now_v7().to_string()),
                    rankings::pool_id.eq(&pool.id),
                    rankings::user_id.eq(user_id),
                    rankings::points.eq(pts),
                    rankings::position.eq(position),
                    rankings::updated_at.eq(now),
                ))
                .execute(conn)?;
        }

        Ok(rows.len())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;
    use diesel::{SqliteConnection, prelude::*};
    use uuid::Uuid;

    use super::compute_and_persist;
    use crate::{
        picks::upsert_pick,
        pools::{add_member, get_or_create_global_pool},
        ranking::RankingEntry,
        schema::{picks, rankings},
        test::{
            insert_category, insert_nominee, insert_user, set_winner,
            setup_conn,
        },
    };

    fn ranking_rows(
        pool_id: &str,
        conn: &mut SqliteConnection,
    ) -> Vec<RankingEntry> {
        rankings::table
            .filter(rankings::pool_id.eq(pool_id))
            .order_by((rankings::position.asc(), rankings::id.asc()))
            .load::<RankingEntry>(conn)
            .unwrap()
    }

    #[test]
    fn one_row_per_participant_no_duplicates() {
        let mut conn = setup_conn();

        let creator = insert_user(&mut conn, "ana");
        let b = insert_user(&mut conn, "bruno");
        let c = insert_user(&mut conn, "carla");

        let global = get_or_create_global_pool(&mut conn).unwrap();
        assert_eq!(global.creator_id, creator);

        // The creator has no membership row; they count regardless.
        add_member(&global.id, &b, &mut conn).unwrap();
        add_member(&global.id, &c, &mut conn).unwrap();

        let n = compute_and_persist(&global, &mut conn).unwrap();
        assert_eq!(n, 3);

        let rows = ranking_rows(&global.id, &mut conn);
        assert_eq!(rows.len(), 3);

        let distinct: HashSet<_> =
            rows.iter().map(|r| r.user_id.clone()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn no_declared_winners_means_everyone_tied_for_first() {
        let mut conn = setup_conn();

        let a = insert_user(&mut conn, "ana");
        let b = insert_user(&mut conn, "bruno");

        let cat = insert_category(&mut conn, "Best Picture", 1);
        let nom1 = insert_nominee(&mut conn, &cat, "Nominee One");
        let nom2 = insert_nominee(&mut conn, &cat, "Nominee Two");

        let global = get_or_create_global_pool(&mut conn).unwrap();
        add_member(&global.id, &a, &mut conn).unwrap();
        add_member(&global.id, &b, &mut conn).unwrap();

        upsert_pick(&a, &global.id, &cat, &nom1, &mut conn).unwrap();
        upsert_pick(&b, &global.id, &cat, &nom2, &mut conn).unwrap();

        compute_and_persist(&global, &mut conn).unwrap();

        for row in ranking_rows(&global.id, &mut conn) {
            assert_eq!(row.points, 0);
            assert_eq!(row.position, 1);
        }
    }

    #[test]
    fn winner_scores_one_point_and_positions_are_dense() {
        let mut conn = setup_conn();

        let a = insert_user(&mut conn, "ana");
        let b = insert_user(&mut conn, "bruno");
        let c = insert_user(&mut conn, "carla");

        let cat = insert_category(&mut conn, "Best Picture", 1);
        let winner = insert_nominee(&mut conn, &cat, "Winner");
        let loser = insert_nominee(&mut conn, &cat, "Loser");

        let global = get_or_create_global_pool(&mut conn).unwrap();
        for user in [&a, &b, &c] {
            add_member(&global.id, user, &mut conn).unwrap();
        }

        upsert_pick(&a, &global.id, &cat, &winner, &mut conn).unwrap();
        upsert_pick(&b, &global.id, &cat, &winner, &mut conn).unwrap();
        upsert_pick(&c, &global.id, &cat, &loser, &mut conn).unwrap();

        set_winner(&mut conn, &winner);
        compute_and_persist(&global, &mut conn).unwrap();

        let rows = ranking_rows(&global.id, &mut conn);
        let of = |uid: &str| {
            rows.iter().find(|r| r.user_id == uid).unwrap().clone()
        };

        assert_eq!(of(&a).points, 1);
        assert_eq!(of(&a).position, 1);
        assert_eq!(of(&b).points, 1);
        assert_eq!(of(&b).position, 1);
        assert_eq!(of(&c).points, 0);
        // Dense: two tied at 1, the next distinct total is position 2.
        assert_eq!(of(&c).position, 2);
    }

    #[test]
    fn recompute_replaces_rows_wholesale() {
        let mut conn = setup_conn();

        let a = insert_user(&mut conn, "ana");
        let global = get_or_create_global_pool(&mut conn).unwrap();
        add_member(&global.id, &a, &mut conn).unwrap();

        compute_and_persist(&global, &mut conn).unwrap();
        compute_and_persist(&global, &mut conn).unwrap();

        assert_eq!(ranking_rows(&global.id, &mut conn).len(), 1);
    }

    #[test]
    fn ties_are_ordered_by_earliest_completion() {
        let mut conn = setup_conn();

        let a = insert_user(&mut conn, "ana");
        let b = insert_user(&mut conn, "bruno");

        let cat = insert_category(&mut conn, "Best Picture", 1);
        let nom = insert_nominee(&mut conn, &cat, "Nominee");

        let global = get_or_create_global_pool(&mut conn).unwrap();
        add_member(&global.id, &a, &mut conn).unwrap();
        add_member(&global.id, &b, &mut conn).unwrap();

        // Bruno completed his set a day before Ana.
        let early = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let late = NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        for (user, at) in [(&b, early), (&a, late)] {
            diesel::insert_into(picks::table)
                .values((
                    picks::id.eq(Uuid::now_v7().to_string()),
                    picks::user_id.eq(user),
                    picks::pool_id.eq(&global.id),
                    picks::category_id.eq(&cat),
                    picks::nominee_id.eq(&nom),
                    picks::created_at.eq(at),
                    picks::updated_at.eq(at),
                ))
                .execute(&mut conn)
                .unwrap();
        }

        compute_and_persist(&global, &mut conn).unwrap();

        let rows = ranking_rows(&global.id, &mut conn);
        assert_eq!(rows[0].user_id, b);
        assert_eq!(rows[1].user_id, a);
        // Same points, so still the same (dense) position.
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[1].position, 1);
    }
}
