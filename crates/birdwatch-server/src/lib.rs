pub mod config;
pub mod render;
pub mod routes;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use anyhow::Result;
use tokio::net::TcpListener;

pub use routes::{build_router, AppState, InnerAppState};

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
