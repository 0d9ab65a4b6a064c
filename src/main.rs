#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mediagrab_lib::run().await
}
