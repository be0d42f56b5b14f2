use clap::Parser;
use portrait_stylizer::Stylizer;
use portrait_stylizer::config::setup_logging;
use portrait_stylizer::web::{AppState, setup_server};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = portrait_stylizer::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let credentials = cli.providers.credentials();
    for provider in portrait_stylizer::Provider::ALL {
        if credentials.for_provider(provider).is_empty() {
            warn!(
                "No {} configured, users must supply one on the page",
                provider.credential_name()
            );
        }
    }

    let stylizer = match Stylizer::new(cli.providers.settings()) {
        Ok(stylizer) => stylizer,
        Err(err) => {
            error!("Failed to build HTTP client: {}", err);
            return;
        }
    };
    info!("Using {:?}", credentials);

    if let Err(err) = setup_server(
        &cli.listen_address,
        cli.port,
        AppState::new(stylizer, credentials),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
