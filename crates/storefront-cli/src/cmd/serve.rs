use anyhow::Context;
use std::path::Path;
use storefront_core::seed::seed_defaults;
use storefront_server::state::AppState;

pub fn run(root: &Path, port: Option<u16>, open_browser: bool) -> anyhow::Result<()> {
    let (config, store) = super::open(root)?;
    seed_defaults(&store, &config.admin, config.seed_sample_data)
        .context("failed to seed the database")?;
    drop(store);

    let port = port.unwrap_or(config.port);
    let state = AppState::new(root.to_path_buf(), &config);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        let actual_port = listener.local_addr()?.port();
        println!("{} → http://localhost:{actual_port}", config.name);
        storefront_server::serve_on(state, listener, open_browser).await
    })
}
