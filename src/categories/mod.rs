use std::collections::HashMap;

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    schema::{categories, nominees},
    state::Conn,
    util_resp::{StandardResponse, ok},
};

pub mod results;

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub display_order: i64,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct Nominee {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub movie: Option<String>,
    pub is_winner: bool,
    pub created_at: chrono::NaiveDateTime,
}

pub fn total_categories(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<i64> {
    categories::table.count().get_result::<i64>(conn)
}

/// Winning nominee id per category, for the categories whose winner has
/// been declared. Undeclared categories are absent from the map.
pub fn declared_winners(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<HashMap<String, String>> {
    Ok(nominees::table
        .filter(nominees::is_winner.eq(true))
        .select((nominees::category_id, nominees::id))
        .load::<(String, String)>(conn)?
        .into_iter()
        .collect())
}

/// Lists every category, in display order, with its nominees.
pub async fn list_categories(mut conn: Conn) -> StandardResponse {
    let cats = categories::table
        .order_by(categories::display_order.asc())
        .load::<Category>(&mut *conn)?;

    let mut by_category: HashMap<String, Vec<Nominee>> = nominees::table
        .load::<Nominee>(&mut *conn)?
        .into_iter()
        .into_group_map_by(|nominee| nominee.category_id.clone());

    let body = cats
        .into_iter()
        .map(|category| {
            let noms =
                by_category.remove(&category.id).unwrap_or_default();
            serde_json::json!({
                "id": category.id,
                "name": category.name,
                "display_order": category.display_order,
                "nominees": noms,
            })
        })
        .collect::<Vec<_>>();

    ok(serde_json::json!({ "categories": body }))
}
