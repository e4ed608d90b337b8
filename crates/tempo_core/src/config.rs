//! Configuração unificada via TOML.
//!
//! Substitui os resources/dimens do app Android por um único `config.toml`
//! ao lado do executável.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Dimensões do mostrador, com alternativas para tela redonda
/// (equivalente aos dimens `*_round` do app original).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDimens {
    pub x_offset: f32,
    pub x_offset_round: f32,
    pub y_offset: f32,
    pub line_height: f32,
    pub big_text_size: f32,
    pub big_text_size_round: f32,
    pub small_text_size: f32,
    pub small_text_size_round: f32,
}

impl Default for LayoutDimens {
    fn default() -> Self {
        Self {
            x_offset: 24.0,
            x_offset_round: 30.0,
            y_offset: 96.0,
            line_height: 30.0,
            big_text_size: 52.0,
            big_text_size_round: 56.0,
            small_text_size: 20.0,
            small_text_size_round: 22.0,
        }
    }
}

/// Configuração do Watch (mostrador).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Porta UDP para escutar updates
    pub port: u16,
    /// Endereços "ip:porta" dos peers conhecidos (phones pareados)
    pub peers: Vec<String>,
    /// Paleta: "midnight", "noir", "high_contrast"
    pub palette: String,
    /// Espera máxima pelo snapshot de cada peer no (re)connect (segundos)
    pub snapshot_wait_secs: f64,
    /// Timeout do fetch de asset (segundos)
    pub asset_timeout_secs: f64,
    /// Formato de tela inicial: "round" ou "square"
    pub shape: String,
    /// Dimensões do mostrador
    pub dimens: LayoutDimens,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            port: 6006,
            peers: vec!["127.0.0.1:6007".into()],
            palette: "midnight".into(),
            snapshot_wait_secs: 3.0,
            asset_timeout_secs: 3.0,
            shape: "round".into(),
            dimens: LayoutDimens::default(),
        }
    }
}

/// Configuração do Phone (companion que empurra o clima).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// IP de destino dos pushes (o watch)
    pub dest_ip: String,
    /// Porta UDP do watch
    pub dest_port: u16,
    /// Porta local onde o phone atende snapshot/asset requests
    pub port: u16,
    /// Intervalo entre pushes de clima (segundos)
    pub push_interval_secs: f64,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            dest_ip: "127.0.0.1".into(),
            dest_port: 6006,
            port: 6007,
            push_interval_secs: 15.0,
            bind_ip: String::new(),
        }
    }
}

/// Configuração raiz do aplicativo (unifica watch e phone).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub phone: PhoneConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.watch.port == 0 {
            errors.push("Porta do watch não pode ser 0".into());
        }
        if self.watch.snapshot_wait_secs <= 0.0 {
            errors.push(format!(
                "Espera de snapshot inválida: {}",
                self.watch.snapshot_wait_secs
            ));
        }
        if self.watch.asset_timeout_secs <= 0.0 {
            errors.push(format!(
                "Timeout de asset inválido: {}",
                self.watch.asset_timeout_secs
            ));
        }
        if self.watch.shape != "round" && self.watch.shape != "square" {
            errors.push(format!("Formato de tela inválido: {}", self.watch.shape));
        }
        if self.phone.port == 0 || self.phone.dest_port == 0 {
            errors.push("Portas do phone não podem ser 0".into());
        }
        if self.phone.push_interval_secs < 0.5 || self.phone.push_interval_secs > 3600.0 {
            errors.push(format!(
                "Intervalo de push inválido: {} (0.5–3600.0)",
                self.phone.push_interval_secs
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.watch.port, parsed.watch.port);
        assert_eq!(config.watch.palette, parsed.watch.palette);
        assert_eq!(config.phone.dest_port, parsed.phone.dest_port);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[watch]
port = 9999
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.watch.port, 9999);
        // Outros campos devem ter valor padrão
        assert_eq!(config.watch.palette, "midnight");
        assert_eq!(config.watch.dimens.y_offset, 96.0);
        assert_eq!(config.phone.port, 6007);
    }

    #[test]
    fn bad_shape_fails_validation() {
        let config = AppConfig {
            watch: WatchConfig {
                shape: "oval".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!config.validate().is_empty());
    }
}
