use autoschematic_connector_aws_cloudfront::connector::CloudFrontConnector;
use autoschematic_core::tarpc_bridge::tarpc_connector_main;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // stdout belongs to the RPC transport.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    tarpc_connector_main::<CloudFrontConnector>().await?;
    Ok(())
}
