//! Definição de paletas de cores do mostrador.
//!
//! Cada paleta carrega dois conjuntos: o interativo e o ambient (baixo
//! consumo). A troca entre eles é feita pela máquina de estados quando o
//! host sinaliza entrada/saída do modo ambient.

use serde::{Deserialize, Serialize};

/// Cor em formato hex string (ex: "#03a9f4") para serialização.
/// A conversão para `egui::Color32` é feita no watch.
pub type Color32Hex = String;

/// Conjunto de cores de um modo do mostrador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteColors {
    pub background: Color32Hex,
    pub time: Color32Hex,
    pub date: Color32Hex,
    pub max_temp: Color32Hex,
    /// Mesma cor nos dois conjuntos por construção: a troca de modo é um
    /// no-op para a temperatura mínima (como no watch face original).
    pub min_temp: Color32Hex,
}

/// Paleta completa (interativa + ambient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub interactive: PaletteColors,
    pub ambient: PaletteColors,
}

/// Converte uma string hex "#RRGGBB" para tupla (r, g, b).
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return (255, 255, 255); // fallback branco
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
    (r, g, b)
}

/// Paleta Midnight (padrão) – azul do app de clima no modo interativo,
/// preto puro no ambient.
pub fn midnight_palette() -> Palette {
    Palette {
        name: "midnight".into(),
        interactive: PaletteColors {
            background: "#03a9f4".into(),
            time: "#ffffff".into(),
            date: "#e1f5fe".into(),
            max_temp: "#ffffff".into(),
            min_temp: "#e1f5fe".into(),
        },
        ambient: PaletteColors {
            background: "#000000".into(),
            time: "#ffffff".into(),
            date: "#9e9e9e".into(),
            max_temp: "#bdbdbd".into(),
            min_temp: "#e1f5fe".into(),
        },
    }
}

/// Paleta Noir – tons de cinza nos dois modos.
pub fn noir_palette() -> Palette {
    Palette {
        name: "noir".into(),
        interactive: PaletteColors {
            background: "#212121".into(),
            time: "#fafafa".into(),
            date: "#bdbdbd".into(),
            max_temp: "#fafafa".into(),
            min_temp: "#9e9e9e".into(),
        },
        ambient: PaletteColors {
            background: "#000000".into(),
            time: "#e0e0e0".into(),
            date: "#757575".into(),
            max_temp: "#9e9e9e".into(),
            min_temp: "#9e9e9e".into(),
        },
    }
}

/// Paleta High Contrast (acessibilidade).
pub fn high_contrast_palette() -> Palette {
    Palette {
        name: "high_contrast".into(),
        interactive: PaletteColors {
            background: "#000000".into(),
            time: "#ffffff".into(),
            date: "#ffff00".into(),
            max_temp: "#00ffff".into(),
            min_temp: "#00ff00".into(),
        },
        ambient: PaletteColors {
            background: "#000000".into(),
            time: "#ffffff".into(),
            date: "#ffffff".into(),
            max_temp: "#ffffff".into(),
            min_temp: "#00ff00".into(),
        },
    }
}

/// Retorna paleta pelo nome.
pub fn get_palette(name: &str) -> Palette {
    match name.to_lowercase().as_str() {
        "noir" => noir_palette(),
        "high_contrast" => high_contrast_palette(),
        _ => midnight_palette(),
    }
}

/// Nomes de paletas disponíveis.
pub fn palette_names() -> Vec<&'static str> {
    vec!["midnight", "noir", "high_contrast"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_rgb_valid() {
        assert_eq!(hex_to_rgb("#ff0000"), (255, 0, 0));
        assert_eq!(hex_to_rgb("#03a9f4"), (3, 169, 244));
        assert_eq!(hex_to_rgb("212121"), (33, 33, 33));
    }

    #[test]
    fn hex_to_rgb_malformed_falls_back_to_white() {
        assert_eq!(hex_to_rgb("#fff"), (255, 255, 255));
        assert_eq!(hex_to_rgb(""), (255, 255, 255));
    }

    #[test]
    fn all_palettes_load() {
        for name in palette_names() {
            let p = get_palette(name);
            assert_eq!(p.name, name);
        }
    }

    #[test]
    fn unknown_palette_returns_midnight() {
        let p = get_palette("nonexistent");
        assert_eq!(p.name, "midnight");
    }

    #[test]
    fn min_temp_swap_is_noop() {
        for name in palette_names() {
            let p = get_palette(name);
            assert_eq!(p.interactive.min_temp, p.ambient.min_temp);
        }
    }
}
