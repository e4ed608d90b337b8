//! Previsão de demonstração e geração do ícone do clima.
//!
//! O companion real leria o provedor de clima do aparelho; aqui um ciclo
//! fixo de condições alimenta os pushes e os ícones são gerados na hora
//! (disco colorido em RGBA, 60×60).

use tempo_core::state::WeatherImage;

/// Lado do ícone gerado.
const ICON_SIDE: u32 = 60;

/// Uma condição de clima do ciclo de demonstração.
#[derive(Debug, Clone, Copy)]
pub struct Condition {
    pub label: &'static str,
    pub max_temp: &'static str,
    pub min_temp: &'static str,
    /// Cor do disco do ícone (RGBA).
    pub icon_color: [u8; 4],
}

/// Ciclo de condições empurradas pelo companion.
pub const CONDITIONS: &[Condition] = &[
    Condition {
        label: "Ensolarado",
        max_temp: "75°",
        min_temp: "50°",
        icon_color: [255, 200, 0, 255],
    },
    Condition {
        label: "Nublado",
        max_temp: "68°",
        min_temp: "47°",
        icon_color: [158, 158, 158, 255],
    },
    Condition {
        label: "Chuva",
        max_temp: "61°",
        min_temp: "44°",
        icon_color: [66, 133, 244, 255],
    },
    Condition {
        label: "Tempestade",
        max_temp: "58°",
        min_temp: "41°",
        icon_color: [69, 90, 100, 255],
    },
];

/// Condição correspondente a um passo do ciclo.
pub fn condition_for_step(step: u64) -> &'static Condition {
    &CONDITIONS[(step as usize) % CONDITIONS.len()]
}

/// Gera o ícone de um handle de asset: o id referencia o passo do ciclo,
/// então qualquer fetch (mesmo atrasado) resolve de forma determinística.
pub fn icon_for(id: u64) -> WeatherImage {
    let color = condition_for_step(id).icon_color;
    let side = ICON_SIDE as i32;
    let center = (side - 1) as f32 / 2.0;
    let radius = side as f32 * 0.42;

    let mut rgba = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if (dx * dx + dy * dy).sqrt() <= radius {
                rgba.extend_from_slice(&color);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]); // transparente
            }
        }
    }

    WeatherImage {
        width: ICON_SIDE,
        height: ICON_SIDE,
        rgba,
    }
}
