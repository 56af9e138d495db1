#[tokio::main]
async fn main() {
    if let Err(err) = vm_api::run().await {
        tracing::error!(error = %err, "vm-api failed");
        eprintln!("vm-api failed: {err}");
        std::process::exit(1);
    }
}
