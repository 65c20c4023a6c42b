use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    categories::{list_categories, results::do_set_winner},
    picks::submit::{
        do_submit_picks, do_update_pick, get_individual_picks,
        get_picks_completed,
    },
    pools::{
        create::do_create_group_pool, do_delete_pool, do_remove_member,
        get_global_pool, get_pool, join::do_join_pool, list_participants,
        list_user_pools,
    },
    ranking::{
        do_recalculate_all, do_recalculate_pool, get_global_ranking,
        get_group_global_position, get_pool_ranking, get_pool_stats,
        get_ranking_summary, get_user_position,
    },
    state::{DbPool, tx_per_request},
    users::{do_upsert_user, get_user},
};

pub fn create_app(pool: DbPool) -> Router {
    Router::new()
        .route("/users", post(do_upsert_user))
        .route("/users/:user_id", get(get_user))
        .route("/categories", get(list_categories))
        .route("/categories/:category_id/winner", post(do_set_winner))
        .route(
            "/pools",
            get(list_user_pools).post(do_create_group_pool),
        )
        .route("/pools/global", get(get_global_pool))
        .route("/pools/join", post(do_join_pool))
        .route("/pools/:pool_id", get(get_pool).delete(do_delete_pool))
        .route("/pools/:pool_id/participants", get(list_participants))
        .route(
            "/pools/:pool_id/members/:user_id",
            delete(do_remove_member),
        )
        .route(
            "/picks",
            get(get_individual_picks).post(do_submit_picks),
        )
        .route("/picks/completed", get(get_picks_completed))
        .route("/picks/:pick_id", patch(do_update_pick))
        .route("/ranking/global", get(get_global_ranking))
        .route("/ranking/summary", get(get_ranking_summary))
        .route("/ranking/recalculate-all", post(do_recalculate_all))
        .route("/ranking/:pool_id", get(get_pool_ranking))
        .route(
            "/ranking/:pool_id/recalculate",
            post(do_recalculate_pool),
        )
        .route(
            "/ranking/:pool_id/user/:user_id",
            get(get_user_position),
        )
        .route(
            "/ranking/:pool_id/global-position",
            get(get_group_global_position),
        )
        .route("/ranking/:pool_id/stats", get(get_pool_stats))
        .layer(middleware::from_fn_with_state(
            pool.clone(),
            tx_per_request,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}
