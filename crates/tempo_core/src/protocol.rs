//! Protocolo de sincronização binário entre phone e watch.
//!
//! Substitui a Data Layer API proprietária por bincode puro sobre UDP.
//! Formato do frame:
//!
//! ```text
//! ┌──────────┬─────────┬──────────────┐
//! │ Magic(1) │ Ver.(1) │ Body (N)     │
//! └──────────┴─────────┴──────────────┘
//! ```
//!
//! - Magic byte `0x57` ('W') identifica frame Tempo
//! - Versão do protocolo (1 byte)
//! - Body serializado com bincode ([`FrameBody`])
//!
//! O payload de config é uma lista de entradas chave/valor: chaves
//! desconhecidas são **ignoradas** na decodificação (forward compatible),
//! nunca rejeitadas.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::{ConfigDelta, WeatherImage};

/// Magic byte que identifica frames do protocolo Tempo.
pub const MAGIC_BYTE: u8 = 0x57; // 'W'

/// Versão atual do protocolo.
pub const PROTOCOL_VERSION: u8 = 1;

/// Tamanho do header (magic + version).
const HEADER_SIZE: usize = 2;

/// Path lógico do data item de clima (mesmo endereço do app original).
pub const SYNC_PATH: &str = "/sunshine_data_update";

/// Chaves reconhecidas no payload de config.
pub const KEY_MAX_TEMP: &str = "maxTemp";
pub const KEY_MIN_TEMP: &str = "minTemp";
pub const KEY_WEATHER_IMAGE: &str = "weatherImage";

/// Tamanho máximo de pacote UDP seguro (sem fragmentação IP garantida).
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Limite de lado para a imagem do clima (sanidade na decodificação).
const MAX_IMAGE_SIDE: u32 = 512;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Magic byte inválido: 0x{0:02X} (esperado 0x{MAGIC_BYTE:02X})")]
    InvalidMagic(u8),

    #[error("Versão incompatível: {0} (suportada: {PROTOCOL_VERSION})")]
    VersionMismatch(u8),

    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),

    #[error("Imagem inválida: {0}")]
    InvalidImage(String),
}

// ──────────────────────────────────────────────
// Corpo do frame
// ──────────────────────────────────────────────

/// Referência opaca a conteúdo binário resolvido sob demanda.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHandle {
    pub id: u64,
}

/// Valor de uma entrada de config.
///
/// Novos tipos de valor entram como variantes novas; o receptor ignora o
/// que não reconhece em vez de rejeitar o frame inteiro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Text(String),
    Asset(AssetHandle),
}

/// Uma entrada chave/valor do payload de config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
}

/// Payload de config (notificação de mudança OU snapshot completo).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    /// Sequência monotônica atribuída pelo phone; usada para descartar
    /// resultados de fetch de asset que ficaram obsoletos.
    pub seq: u64,
    pub entries: Vec<ConfigEntry>,
}

/// Corpo de um frame Tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameBody {
    /// Update (parcial ou snapshot) de config empurrado pelo phone.
    Config(ConfigPayload),
    /// Watch pede o snapshot atual no path dado.
    SnapshotRequest { path: String },
    /// Watch pede os bytes de um asset.
    AssetRequest { id: u64 },
    /// Resposta do phone. `bytes: None` = asset indisponível (não é erro).
    AssetResponse { id: u64, bytes: Option<Vec<u8>> },
}

// ──────────────────────────────────────────────
// Encode / decode
// ──────────────────────────────────────────────

/// Codifica um [`FrameBody`] para transmissão UDP.
///
/// Retorna bytes no formato: `[MAGIC][VERSION][bincode_body...]`
pub fn encode_frame(body: &FrameBody) -> Result<Vec<u8>, ProtocolError> {
    let encoded = bincode::serialize(body).map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + encoded.len());
    frame.push(MAGIC_BYTE);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&encoded);

    Ok(frame)
}

/// Decodifica bytes recebidos via UDP em [`FrameBody`].
///
/// Valida magic byte e versão antes de deserializar.
pub fn decode_frame(data: &[u8]) -> Result<FrameBody, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }

    let magic = data[0];
    if magic != MAGIC_BYTE {
        return Err(ProtocolError::InvalidMagic(magic));
    }

    let version = data[1];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }

    bincode::deserialize(&data[HEADER_SIZE..])
        .map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Payload de config → delta
// ──────────────────────────────────────────────

impl ConfigPayload {
    /// Extrai o delta com as chaves reconhecidas; o resto é ignorado.
    pub fn to_delta(&self) -> ConfigDelta {
        let mut delta = ConfigDelta {
            seq: self.seq,
            ..Default::default()
        };

        for entry in &self.entries {
            match (entry.key.as_str(), &entry.value) {
                (KEY_MAX_TEMP, ConfigValue::Text(t)) => delta.max_temp = Some(t.clone()),
                (KEY_MIN_TEMP, ConfigValue::Text(t)) => delta.min_temp = Some(t.clone()),
                (KEY_WEATHER_IMAGE, ConfigValue::Asset(h)) => delta.weather_asset = Some(*h),
                _ => {
                    // Chave desconhecida ou tipo de valor inesperado
                    debug!("Ignorando entrada de config \"{}\"", entry.key);
                }
            }
        }

        delta
    }

    /// Constrói um payload a partir dos campos opcionais (lado do phone).
    pub fn from_fields(
        seq: u64,
        max_temp: Option<&str>,
        min_temp: Option<&str>,
        weather_asset: Option<AssetHandle>,
    ) -> Self {
        let mut entries = Vec::new();
        if let Some(max) = max_temp {
            entries.push(ConfigEntry {
                key: KEY_MAX_TEMP.into(),
                value: ConfigValue::Text(max.into()),
            });
        }
        if let Some(min) = min_temp {
            entries.push(ConfigEntry {
                key: KEY_MIN_TEMP.into(),
                value: ConfigValue::Text(min.into()),
            });
        }
        if let Some(handle) = weather_asset {
            entries.push(ConfigEntry {
                key: KEY_WEATHER_IMAGE.into(),
                value: ConfigValue::Asset(handle),
            });
        }
        Self { seq, entries }
    }
}

// ──────────────────────────────────────────────
// Bytes de asset ↔ imagem
// ──────────────────────────────────────────────

/// Codifica uma [`WeatherImage`] nos bytes transportados num `AssetResponse`.
pub fn encode_weather_image(image: &WeatherImage) -> Result<Vec<u8>, ProtocolError> {
    if !image.is_consistent() {
        return Err(ProtocolError::InvalidImage(format!(
            "buffer de {} bytes não bate com {}x{}",
            image.rgba.len(),
            image.width,
            image.height
        )));
    }
    bincode::serialize(image).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Decodifica os bytes de um asset em [`WeatherImage`], validando dimensões.
pub fn decode_weather_image(bytes: &[u8]) -> Result<WeatherImage, ProtocolError> {
    let image: WeatherImage =
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Deserialize(e.to_string()))?;

    if image.width > MAX_IMAGE_SIDE || image.height > MAX_IMAGE_SIDE {
        return Err(ProtocolError::InvalidImage(format!(
            "{}x{} excede o limite de {MAX_IMAGE_SIDE}px",
            image.width, image.height
        )));
    }
    if !image.is_consistent() {
        return Err(ProtocolError::InvalidImage(format!(
            "buffer de {} bytes não bate com {}x{}",
            image.rgba.len(),
            image.width,
            image.height
        )));
    }

    Ok(image)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
