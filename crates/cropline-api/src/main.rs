use cropline_core::CroplineConfig;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = CroplineConfig::from_env()?;

    // Initialize the application (storage, renderer, routes)
    let (_state, router) = cropline_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    cropline_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
