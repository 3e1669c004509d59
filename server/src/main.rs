use frames_server::{config::Config, error::Result, handlers::web};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!("Using {config:?}");

    let app = web::AppState::new(config);
    web::run(app).await
}
