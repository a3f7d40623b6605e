mod auth;
mod config;
mod db;
mod error;
mod forms;
mod listing;
mod models;
mod routes;
mod screening;
mod state;
mod uploads;
mod validation;

#[cfg(test)]
mod test_support;

use actix_web::{middleware, web, App, HttpServer};

use crate::{config::Config, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Config::from_env()?;
    db::ensure_sqlite_dir(&config.database_url)?;
    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    db::seed_admin(&pool, &config.admin_email, &config.admin_password).await?;

    let state = AppState::from_config(pool, &config)?;
    tokio::fs::create_dir_all(state.uploads.root()).await?;

    let address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting astroface on http://{address}");

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .configure(routes::dashboard::configure(static_dir.clone()))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
