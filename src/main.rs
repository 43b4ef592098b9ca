use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use content_polls::config::Config;
use content_polls::{web, FileStorage, PollStore, Storage};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        },
    };

    let storage = match FileStorage::open(&config.storage_dir) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to open poll storage: {e}");
            process::exit(1);
        },
    };
    info!("Storing polls under {} as {:?} and {:?}",
        storage.dir().display(), config.keys.polls, config.keys.votes);

    let store = PollStore::with_keys(Box::new(storage) as Box<dyn Storage>, config.keys);
    web::serve(web::shared(store), config.port).await;
}
