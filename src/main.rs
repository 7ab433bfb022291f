use actix_web::{App, HttpServer};
use askdocs::api::middleware::RequestLog;
use askdocs::cli::{commands::{Cli, Commands}, run_cli};
use askdocs::config::AppConfig;
use askdocs::services::Services;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // `.env` may carry RUST_LOG, so it is read before the subscriber starts.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let services = match Services::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        None | Some(Commands::Serve) => {}
        Some(command) => std::process::exit(run_cli(command, services).await),
    }

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Starting AskDocs on http://{}:{}/", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLog)
            .configure(|cfg| services.configure(cfg))
            .configure(askdocs::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
