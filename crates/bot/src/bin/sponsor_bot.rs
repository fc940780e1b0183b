use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    sponsor_bot::main_entry().await
}
