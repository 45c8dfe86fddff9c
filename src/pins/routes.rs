use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::{AppState, discovery};
use crate::kv::KeyValueStore;

pub fn routes<K: KeyValueStore>() -> Router<AppState<K>> {
    Router::new()
        .route(
            "/user/:username/pinned",
            get(handler::list_pins::<K>)
                .post(handler::pin_repo::<K>)
                .delete(handler::unpin_repo::<K>)
                .fallback(discovery),
        )
        .route(
            "/user/:username/reorder",
            post(handler::reorder_pins::<K>).fallback(discovery),
        )
}
