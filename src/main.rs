use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};

use e_com::config::Config;
use e_com::db::{self, MongoStore};
use e_com::payment::RazorpayClient;
use e_com::storage::S3Storage;
use e_com::{configure, cors, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // reads .env before the logger picks up RUST_LOG
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let database = db::connect(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let store = Arc::new(MongoStore::new(database));
    let storage = S3Storage::new(config.storage.clone())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let state = web::Data::new(AppState {
        users: store.clone(),
        products: store.clone(),
        collections: store.clone(),
        coupons: store,
        payments: Arc::new(RazorpayClient::new(config.razorpay.clone())),
        storage: Arc::new(storage),
        auth: config.auth.clone(),
        currency: config.razorpay.currency.clone(),
    });

    let addr = config.socket_addr();
    log::info!("Listening on {addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(Logger::new("%r %s %b - %D ms"))
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}
