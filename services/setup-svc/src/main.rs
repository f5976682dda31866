#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_svc::run().await
}
