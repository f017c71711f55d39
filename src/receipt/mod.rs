use axum::{routing::post, Router};

mod code;
mod create;
mod layout;

pub use code::RedemptionCode;
pub use layout::{local_now, printed_at, LocalClock, Receipt};

pub fn router(state: crate::AppState) -> Router {
    Router::new()
        .route("/CreateReceipt", post(create::create_receipt))
        .with_state(state)
}
