//! Browser chat frontend for careerday.
//!
//! ```text
//! careerday-web [ADDR]    # default 127.0.0.1:8080
//! ```

use careerday::event::LoggingEventHandler;
use careerday::session::{NvidiaClientFactory, SessionStore};
use careerday::web::{serve, AppState};
use careerday::SimulationConfig;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const REAPER_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    careerday::init_logger();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
        .parse()?;

    let store = SessionStore::new(SimulationConfig::default())
        .with_event_handler(Arc::new(LoggingEventHandler));
    let state = AppState::new(store, Arc::new(NvidiaClientFactory::default()));
    state.store.spawn_reaper(REAPER_PERIOD);

    serve(addr, state).await
}
