// src/main.rs
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cinedex::app::CinedexApp;
use cinedex::config::load_config;

fn pick_renderer() -> eframe::Renderer {
    match env::var("CINEDEX_RENDERER").as_deref() {
        Ok("glow") => eframe::Renderer::Glow,
        Ok("wgpu") => eframe::Renderer::Wgpu,
        _ => {
            // Windows = WGPU (DX12), others = Glow (GL)
            #[cfg(target_os = "windows")]
            { eframe::Renderer::Wgpu }
            #[cfg(not(target_os = "windows"))]
            { eframe::Renderer::Glow }
        }
    }
}

fn main() -> eframe::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let config = load_config();
    info!(
        "cinedex {} using {} (cache {})",
        env!("CARGO_PKG_VERSION"),
        config.tmdb_api_url,
        config.cache_dir_path().display()
    );

    let options = eframe::NativeOptions {
        renderer: pick_renderer(),
        multisampling: 0,
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Cinedex")
            .with_inner_size([1180.0, 820.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    match eframe::run_native(
        "Cinedex",
        options,
        Box::new(|_cc| Ok(Box::new(CinedexApp::new(config)?))),
    ) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("eframe failed to start: {e:?}");
            error!("Hint: try CINEDEX_RENDERER=wgpu or CINEDEX_RENDERER=glow.");
            Err(e)
        }
    }
}
