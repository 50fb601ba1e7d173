#[tokio::main]
async fn main() {
    skyfeed::start_server().await;
}
