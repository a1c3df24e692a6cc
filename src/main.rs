use remote_call::{apis, build_app, config::Config, logging, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let registry = apis::registry()?;

    let bind_socket = config.bind_socket()?;
    let methods = registry.len();
    let app = build_app(AppState::new(registry));
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        methods,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
