use filehaven_api::config::AppConfig;

#[tokio::main]
async fn main() {
    filehaven_observability::init();

    // Configuration problems (above all a missing signing secret) are fatal
    // here: limping on would turn every request into an unexplainable 401.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "fatal configuration error");
            eprintln!("fatal configuration error: {e}");
            std::process::exit(1);
        }
    };

    let app = match filehaven_api::app::build_app(&config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to build application");
            eprintln!("failed to build application: {e}");
            std::process::exit(1);
        }
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
