use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshop::infrastructure::AppState;
use bookshop::{config, db, import, seed, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    // Check for --profile CLI argument
    if let Some(pos) = args.iter().position(|arg| arg == "--profile") {
        if let Some(val) = args.get(pos + 1) {
            unsafe { std::env::set_var("PROFILE", val) };
        }
    }

    let config = config::Config::from_env();

    // Initialize database
    let db = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");

    // --import-addresses [path]: load the postal code directory and exit
    if let Some(pos) = args.iter().position(|arg| arg == "--import-addresses") {
        let path = args
            .get(pos + 1)
            .filter(|a| !a.starts_with("--"))
            .cloned()
            .unwrap_or_else(|| config.address_csv_path.clone());

        match import::import_addresses(&db, &path, &config.address_csv_encoding).await {
            Ok(summary) => println!(
                "{} address records created in {:.2} secs.",
                summary.inserted,
                summary.elapsed.as_secs_f64()
            ),
            Err(e) => {
                tracing::error!("Address import failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&AppState::new(db.clone())).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    server::serve(db, &config)
        .await
        .expect("Failed to start server");
}
