//! Estado do mostrador e pipeline de aplicação de config.
//!
//! Porta do par temperatura máx/mín + bitmap do clima mantido pelo watch
//! face original. O update é sempre **parcial**: só os campos presentes
//! no delta sobrescrevem o valor anterior.

use serde::{Deserialize, Serialize};

use crate::protocol::AssetHandle;

// ──────────────────────────────────────────────
// Imagem do clima
// ──────────────────────────────────────────────

/// Imagem decodificada (RGBA 8-bit por canal, row-major).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeatherImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl WeatherImage {
    /// Imagem de cor sólida (útil em testes e no ícone gerado pelo phone).
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = (width * height) as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&color);
        }
        Self { width, height, rgba }
    }

    /// Verifica se o buffer bate com as dimensões declaradas.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

// ──────────────────────────────────────────────
// Config do mostrador
// ──────────────────────────────────────────────

/// Estado compartilhado lido pelo renderer a cada frame.
///
/// Last-write-wins, sem histórico. String vazia é o piso para as
/// temperaturas: nunca existe "null" no caminho de desenho.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayConfig {
    pub max_temp: String,
    pub min_temp: String,
    pub weather_image: Option<WeatherImage>,
}

/// Update parcial extraído de um payload de config.
///
/// `None` = chave ausente no payload, campo anterior fica intacto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDelta {
    /// Número de sequência monotônico do payload de origem.
    pub seq: u64,
    pub max_temp: Option<String>,
    pub min_temp: Option<String>,
    pub weather_asset: Option<AssetHandle>,
}

impl ConfigDelta {
    /// Delta sem nenhuma chave (aplicar é um no-op visível).
    pub fn is_empty(&self) -> bool {
        self.max_temp.is_none() && self.min_temp.is_none() && self.weather_asset.is_none()
    }
}

impl DisplayConfig {
    /// Aplica um delta parcial: sobrescreve exatamente os campos presentes.
    ///
    /// A imagem NÃO é tocada aqui – o asset precisa ser resolvido fora do
    /// caminho de render (ver `tempo_watch::assets`) e entra depois via
    /// [`DisplayConfig::set_image`].
    ///
    /// Retorna `true` se algum campo de texto mudou de valor.
    pub fn apply(&mut self, delta: &ConfigDelta) -> bool {
        let mut changed = false;
        if let Some(max) = &delta.max_temp {
            if *max != self.max_temp {
                self.max_temp = max.clone();
                changed = true;
            }
        }
        if let Some(min) = &delta.min_temp {
            if *min != self.min_temp {
                self.min_temp = min.clone();
                changed = true;
            }
        }
        changed
    }

    /// Substitui a imagem do clima (resultado de um fetch bem-sucedido).
    pub fn set_image(&mut self, image: WeatherImage) {
        self.weather_image = Some(image);
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_empty_strings() {
        let c = DisplayConfig::default();
        assert_eq!(c.max_temp, "");
        assert_eq!(c.min_temp, "");
        assert!(c.weather_image.is_none());
    }

    #[test]
    fn apply_max_only_keeps_min_and_image() {
        // Cenário 1 da especificação de comportamento original
        let mut c = DisplayConfig::default();
        let delta = ConfigDelta {
            seq: 1,
            max_temp: Some("75°".into()),
            ..Default::default()
        };
        assert!(c.apply(&delta));
        assert_eq!(c.max_temp, "75°");
        assert_eq!(c.min_temp, "");
        assert!(c.weather_image.is_none());
    }

    #[test]
    fn apply_min_after_max_keeps_max() {
        // Cenário 2: segundo delta só com minTemp não apaga maxTemp
        let mut c = DisplayConfig::default();
        c.apply(&ConfigDelta {
            seq: 1,
            max_temp: Some("75°".into()),
            ..Default::default()
        });
        c.apply(&ConfigDelta {
            seq: 2,
            min_temp: Some("50°".into()),
            ..Default::default()
        });
        assert_eq!(c.max_temp, "75°");
        assert_eq!(c.min_temp, "50°");
    }

    #[test]
    fn empty_delta_changes_nothing() {
        let mut c = DisplayConfig {
            max_temp: "70°".into(),
            min_temp: "55°".into(),
            weather_image: Some(WeatherImage::solid(2, 2, [255, 0, 0, 255])),
        };
        let before = c.clone();
        assert!(!c.apply(&ConfigDelta::default()));
        assert_eq!(c, before);
    }

    #[test]
    fn apply_same_value_reports_unchanged() {
        let mut c = DisplayConfig::default();
        let delta = ConfigDelta {
            seq: 1,
            max_temp: Some("75°".into()),
            ..Default::default()
        };
        assert!(c.apply(&delta));
        assert!(!c.apply(&delta));
    }

    #[test]
    fn solid_image_is_consistent() {
        let img = WeatherImage::solid(60, 60, [10, 20, 30, 255]);
        assert!(img.is_consistent());
        assert_eq!(img.rgba.len(), 60 * 60 * 4);
    }

    #[test]
    fn truncated_image_is_inconsistent() {
        let mut img = WeatherImage::solid(4, 4, [0, 0, 0, 255]);
        img.rgba.pop();
        assert!(!img.is_consistent());
    }
}
