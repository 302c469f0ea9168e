//! Main entry point for the lnme backend.
//!
//! This file initializes logging, loads the configuration, connects to the
//! LND node and serves the invoice and Lightning Address endpoints.
//! Startup failures come back as a typed error and end the process here.

mod api;
mod config;
mod errors;
mod lnurl;
mod services;

use config::Config;
use errors::StartupError;
use services::{
    invoice_service::InvoiceService, lnurl_service::LnurlPayService,
    node_manager::{LightningClient, LndNode},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, info_span};
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    if let Err(err) = run().await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    let node: Arc<dyn LightningClient> = Arc::new(
        LndNode::connect(config.lnd_credentials(), info_span!("lnd", address = %config.lnd_address))
            .await?,
    );
    let invoices = Arc::new(InvoiceService::new(node, info_span!("invoices")));
    let lnurl = Arc::new(LnurlPayService::new(invoices.clone(), info_span!("lnurl")));

    let app = api::router(&config, invoices, lnurl);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Starting lnme server on {}", bind_address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
