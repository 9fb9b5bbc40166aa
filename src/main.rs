use astra::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tourdesk::config::Config;
use tourdesk::db::connection::{init_db, Database};
use tourdesk::rates_feed::{LiveRates, RatesSource, StaticRates};
use tourdesk::responses::error_to_response;
use tourdesk::router::{handle, AppState};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tourdesk=info")))
        .init();

    let config = Config::from_env();

    let db = Database::new(config.database.path.clone());
    if let Err(e) = init_db(&db, &config.database.schema_path) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let rates: Arc<dyn RatesSource> = match LiveRates::new(&config.rates) {
        Ok(live) => Arc::new(live),
        Err(e) => {
            tracing::warn!(error = %e, "live rates disabled, serving the fallback table");
            Arc::new(StaticRates(config.rates.fallback))
        }
    };

    let addr: SocketAddr = match config.bind_address().parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(address = %config.bind_address(), error = %e, "invalid bind address");
            std::process::exit(1);
        }
    };
    let workers = config.server.max_workers;
    let state = AppState::new(db, config, rates);

    tracing::info!(%addr, workers, "starting server");
    let server = Server::bind(&addr).max_workers(workers);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }
    tracing::info!("server shut down");
}
