use axum::{Json, extract::Path};
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    categories::Nominee,
    ranking::orchestrate,
    schema::nominees,
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, conflict, ok,
    },
};

#[derive(Deserialize)]
pub struct SetWinnerForm {
    nominee_id: String,
}

/// Declares the winning nominee of a category. A category's winner can be
/// set exactly once; a second attempt is rejected.
pub async fn do_set_winner(
    Path(category_id): Path<String>,
    mut conn: Conn,
    Json(form): Json<SetWinnerForm>,
) -> StandardResponse {
    let nominee = nominees::table
        .filter(nominees::id.eq(&form.nominee_id))
        .first::<Nominee>(&mut *conn)
        .optional()?
        .ok_or(FailureResponse::NotFound(()))?;

    if nominee.category_id != category_id {
        return bad_request("nominee does not belong to this category");
    }

    let already_declared = diesel::select(diesel::dsl::exists(
        nominees::table.filter(
            nominees::category_id
                .eq(&category_id)
                .and(nominees::is_winner.eq(true)),
        ),
    ))
    .get_result::<bool>(&mut *conn)?;

    if already_declared {
        return conflict("winner already declared for this category");
    }

    diesel::update(nominees::table.filter(nominees::id.eq(&nominee.id)))
        .set(nominees::is_winner.eq(true))
        .execute(&mut *conn)?;

    // Every pool's standings change when a winner lands; refresh is
    // best-effort and never fails the declaration itself.
    orchestrate::refresh_all(&mut *conn);

    ok(serde_json::json!({ "nominee": Nominee {
        is_winner: true,
        ..nominee
    }}))
}
