//! Test support and end-to-end workloads.

use chrono::NaiveDate;
use diesel::{Connection, SqliteConnection, prelude::*};
use diesel_migrations::MigrationHarness;
use uuid::Uuid;

use crate::{
    MIGRATIONS,
    schema::{categories, nominees, users},
};


pub fn setup_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn
}

/// Inserts a user with a registration time strictly after every existing
/// user's, so "earliest user" lookups are deterministic in tests.
pub fn insert_user(conn: &mut SqliteConnection, name: &str) -> String {
    let n = users::table.count().get_result::<i64>(conn).unwrap();

    let at = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(n);

    let id = Uuid::now_v7().to_string();
    diesel::insert_into(users::table)
        .values((
            users::id.eq(&id),
            users::name.eq(name),
            users::email.eq(format!("{name}@example.com")),
            users::city.eq(None::<String>),
            users::state.eq(None::<String>),
            users::created_at.eq(at),
            users::updated_at.eq(at),
        ))
        .execute(conn)
        .unwrap();

    id
}

pub fn insert_category(
    conn: &mut SqliteConnection,
    name: &str,
    display_order: i64,
) -> String {
    let id = Uuid::now_v7().to_string();
    diesel::insert_into(categories::table)
        .values((
            categories::id.eq(&id),
            categories::name.eq(name),
            categories::display_order.eq(display_order),
            categories::created_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)
        .unwrap();

    id
}

pub fn insert_nominee(
    conn: &mut SqliteConnection,
    category_id: &str,
    name: &str,
) -> String {
    let id = Uuid::now_v7().to_string();
    diesel::insert_into(nominees::table)
        .values((
            nominees::id.eq(&id),
            nominees::category_id.eq(category_id),
            nominees::name.eq(name),
            nominees::movie.eq(None::<String>),
            nominees::is_winner.eq(false),
            nominees::created_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)
        .unwrap();

    id
}

pub fn insert_group_pool(
    conn: &mut SqliteConnection,
    name: &str,
    creator_id: &str,
) -> String {
    use crate::schema::{pool_members, pools};

    let n = pools::table.count().get_result::<i64>(conn).unwrap();
    let now = chrono::Utc::now().naive_utc();

    let id = Uuid::now_v7().to_string();
    diesel::insert_into(pools::table)
        .values((
            pools::id.eq(&id),
            pools::name.eq(name),
            pools::kind.eq(crate::pools::KIND_GROUP),
            pools::invite_code.eq(format!("C{n:05}")),
            pools::creator_id.eq(creator_id),
            pools::created_at.eq(now),
        ))
        .execute(conn)
        .unwrap();

    diesel::insert_into(pool_members::table)
        .values((
            pool_members::id.eq(Uuid::now_v7().to_string()),
            pool_members::pool_id.eq(&id),
            pool_members::user_id.eq(creator_id),
            pool_members::joined_at.eq(now),
        ))
        .execute(conn)
        .unwrap();

    id
}

pub fn set_winner(conn: &mut SqliteConnection, nominee_id: &str) {
    diesel::update(nominees::table.filter(nominees::id.eq(nominee_id)))
        .set(nominees::is_winner.eq(true))
        .execute(conn)
        .unwrap();
}
