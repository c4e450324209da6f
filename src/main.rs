#[tokio::main]
async fn main() -> anyhow::Result<()> {
    surfpilot_cli::cli::run().await
}
