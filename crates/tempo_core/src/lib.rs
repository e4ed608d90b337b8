//! # Tempo Core
//!
//! Crate compartilhada que define o estado do mostrador, o protocolo de
//! sincronização binário (bincode), a máquina de estados do relógio,
//! o layout por formato de tela e a configuração TOML do sistema Tempo.
//!
//! ## Módulos
//! - [`state`] – Estado do mostrador (temperaturas, imagem do clima)
//! - [`protocol`] – Frames binários com magic byte (config, snapshot, assets)
//! - [`engine`] – Máquina de estados (visível/ambient/mute) e timer de redraw
//! - [`layout`] – Offsets e tamanhos de fonte por formato de tela
//! - [`config`] – Configuração unificada via TOML
//! - [`theme`] – Paletas de cores (interativa + ambient)

pub mod state;
pub mod protocol;
pub mod engine;
pub mod layout;
pub mod config;
pub mod theme;

// Re-exports convenientes
pub use state::{ConfigDelta, DisplayConfig, WeatherImage};
pub use protocol::{decode_frame, encode_frame, FrameBody, PROTOCOL_VERSION, SYNC_PATH};
pub use engine::WatchEngine;
pub use config::{AppConfig, PhoneConfig, WatchConfig};
