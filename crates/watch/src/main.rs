//! # Tempo Watch
//!
//! Mostrador de relógio digital com clima sincronizado do phone via UDP.
//! A hora e a data são desenhadas a cada tick; as temperaturas e o ícone
//! do clima chegam como updates parciais de config do companion.
//!
//! ## Atalhos (sinais de host simulados)
//! - `A`: Modo ambient
//! - `M`: Mute (filtro de interrupção)
//! - `L`: Capacidade low-bit ambient
//! - `B`: Proteção contra burn-in
//! - `S`: Formato de tela (round/square)
//! - `Z`: Mudança de fuso horário
//! - `F` / `F11`: Fullscreen
//! - `Q` / `Esc`: Sair

mod assets;
mod face;
mod listener;
mod palette_egui;

use face::WatchFace;
use tempo_core::config::AppConfig;
use tracing::warn;

fn main() -> eframe::Result<()> {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    for error in config.validate() {
        warn!("Config: {error}");
    }

    if !config_path.exists() {
        let _ = config.save(&config_path);
    }

    // ── Janela eframe ──
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("⌚ Tempo Watch")
            .with_inner_size([320.0, 320.0])
            .with_min_inner_size([240.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tempo Watch",
        options,
        Box::new(move |cc| Ok(Box::new(WatchFace::new(cc, config)))),
    )
}
