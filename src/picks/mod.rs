use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{categories::total_categories, schema::picks};

pub mod submit;

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct Pick {
    pub id: String,
    pub user_id: String,
    pub pool_id: String,
    pub category_id: String,
    pub nominee_id: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Insert-or-replace keyed by (user, category, pool). Last write wins;
/// `created_at` survives replacement so the completion timestamp of a
/// pick set is not advanced by edits.
pub fn upsert_pick(
    user_id: &str,
    pool_id: &str,
    category_id: &str,
    nominee_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    let now = Utc::now().naive_utc();

    diesel::insert_into(picks::table)
        .values((
            picks::id.eq(Uuid::now_v7().to_string()),
            picks::user_id.eq(user_id),
            picks::pool_id.eq(pool_id),
            picks::category_id.eq(category_id),
            picks::nominee_id.eq(nominee_id),
            picks::created_at.eq(now),
            picks::updated_at.eq(now),
        ))
        .on_conflict((picks::user_id, picks::category_id, picks::pool_id))
        .do_update()
        .set((picks::nominee_id.eq(nominee_id), picks::updated_at.eq(now)))
        .execute(conn)?;

    Ok(())
}

/// A pick set is complete when the user holds exactly one pick per
/// category in the pool. The unique key on (user, category, pool) makes
/// the count comparison sufficient.
pub fn has_completed_all_picks(
    user_id: &str,
    pool_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    let total = total_categories(conn)?;

    let count = picks::table
        .filter(
            picks::user_id
                .eq(user_id)
                .and(picks::pool_id.eq(pool_id)),
        )
        .count()
        .get_result::<i64>(conn)?;

    Ok(count == total)
}

/// Snapshots the user's picks from one pool into another. This is how
/// individual picks become a group's starting picks; the copies are
/// independent rows and later edits to the source do not reach them.
/// Runs inside the caller's transaction, so the copy is all-or-nothing.
pub fn copy_picks(
    user_id: &str,
    from_pool_id: &str,
    to_pool_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<usize> {
    let source = picks::table
        .filter(
            picks::user_id
                .eq(user_id)
                .and(picks::pool_id.eq(from_pool_id)),
        )
        .load::<Pick>(conn)?;

    if source.is_empty() {
        return Ok(0);
    }

    for pick in &source {
        upsert_pick(
            user_id,
            to_pool_id,
            &pick.category_id,
            &pick.nominee_id,
            conn,
        )?;
    }

    Ok(source.len())
}

/// A user's picks in one pool, with category and nominee payloads, in
/// category display order.
pub fn picks_of_user_in_pool(
    user_id: &str,
    pool_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<serde_json::Value>> {
    use crate::schema::{categories, nominees};

    let rows = picks::table
        .inner_join(categories::table)
        .inner_join(nominees::table)
        .filter(
            picks::user_id
                .eq(user_id)
                .and(picks::pool_id.eq(pool_id)),
        )
        .order_by(categories::display_order.asc())
        .select((
            (
                picks::id,
                picks::user_id,
                picks::pool_id,
                picks::category_id,
                picks::nominee_id,
                picks::created_at,
                picks::updated_at,
            ),
            (categories::name, categories::display_order),
            (nominees::name, nominees::movie, nominees::is_winner),
        ))
        .load::<(
            Pick,
            (String, i64),
            (String, Option<String>, bool),
        )>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(pick, (category_name, display_order), nominee)| {
            serde_json::json!({
                "id": pick.id,
                "user_id": pick.user_id,
                "pool_id": pick.pool_id,
                "category_id": pick.category_id,
                "nominee_id": pick.nominee_id,
                "created_at": pick.created_at,
                "updated_at": pick.updated_at,
                "category": {
                    "id": pick.category_id,
                    "name": category_name,
                    "display_order": display_order,
                },
                "nominee": {
                    "id": pick.nominee_id,
                    "name": nominee.0,
                    "movie": nominee.1,
                    "is_winner": nominee.2,
                },
            })
        })
        .collect())
}
