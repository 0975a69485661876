use clap::Parser;
use grpcweb_server::{GrpcWebServer, ServerConfig};
use interop_demo::TestService;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Serve the interop test service to gRPC and gRPC-Web clients
#[derive(Parser)]
#[command(name = "interop-demo", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Response body chunks buffered per request
    #[arg(long, default_value_t = 16)]
    body_buffer: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let server = GrpcWebServer::builder(TestService)
        .config(ServerConfig::new().body_buffer(cli.body_buffer))
        .build();

    server.serve(cli.addr).await?;
    Ok(())
}
