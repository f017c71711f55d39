use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod err_responses;
mod printer;
mod receipt;
mod upstream;

#[derive(Parser, Debug)]
#[command(name = "receipt-printer")]
#[command(about = "Prints Bitcoin purchase receipts with a redemption code")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RECEIPT_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "RECEIPT_PORT", default_value = "5000")]
    port: u16,

    /// JSON file with printer, upstream and receipt settings
    #[arg(long, env = "RECEIPT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "receipt_printer=debug,tower_http=debug"
    #[arg(long, env = "RECEIPT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Clone)]
struct AppState {
    upstream: upstream::UpstreamClient,
    printer: printer::SharedPrinter,
    receipt: Arc<config::ReceiptConfig>,
    clock: receipt::LocalClock,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load(args.config.as_deref())?;
    let printer = printer::open(&config.printer).context("could not open receipt printer")?;
    let upstream = upstream::UpstreamClient::new(&config.upstream)?;

    let state = AppState {
        upstream,
        printer,
        receipt: Arc::new(config.receipt),
        clock: Arc::new(receipt::local_now),
    };

    let router = Router::new()
        .merge(receipt::router(state))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not listen on {addr}"))?;
    tracing::info!(%addr, "Printer service is running");

    axum::serve(listener, router).await?;

    Ok(())
}
