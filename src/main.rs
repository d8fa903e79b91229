use tokio::net::TcpListener;
use tracing::info;

use workout_tracker::api::routes::create_routes;
use workout_tracker::config::{run_migrations, AppConfig, DatabaseConfig};
use workout_tracker::services::{JobRunner, ProcessorOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let app_config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    let mut job_runner = JobRunner::start(pool.clone(), &app_config).await?;

    let options = ProcessorOptions {
        hours_advance_creation: app_config.hours_advance_creation,
        max_hours_late: app_config.max_hours_late,
    };
    let app = create_routes(pool, options);

    let address = app_config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Workout tracker listening on http://{}", address);

    axum::serve(listener, app).await?;

    job_runner.shutdown().await?;
    Ok(())
}
