use std::net::TcpListener;
use statusboard::auth::SessionController;
use statusboard::configuration::get_configuration;
use statusboard::startup::{run, Stores};
use statusboard::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let stores = Stores::from_settings(&configuration).await.map_err(|e| {
        tracing::error!("Failed to initialise stores: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Store initialisation error")
    })?;

    let sessions = SessionController::from_settings(
        &configuration.jwt,
        stores.users.clone(),
        stores.revocations.clone(),
    )
    .map_err(|e| {
        tracing::error!("Invalid JWT configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, sessions, stores.statuses)?;
    server.await
}
