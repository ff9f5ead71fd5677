#[tokio::main]
async fn main() {
    bhashabuddy::run().await;
}
