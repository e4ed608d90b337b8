//! Offsets e tamanhos de fonte por formato de tela.
//!
//! Equivalente ao `onApplyWindowInsets` do watch face original: telas
//! redondas ganham offsets e fontes ligeiramente maiores. O cálculo é
//! puro e idempotente.

use serde::{Deserialize, Serialize};

use crate::config::LayoutDimens;

/// Formato de tela reportado pelo host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenShape {
    Round,
    Square,
}

impl ScreenShape {
    /// Parse a partir do valor do config ("round"/"square").
    pub fn from_name(name: &str) -> Self {
        match name {
            "square" => ScreenShape::Square,
            _ => ScreenShape::Round,
        }
    }
}

/// Métricas resolvidas para um formato de tela.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub shape: ScreenShape,
    pub x_offset: f32,
    pub y_offset: f32,
    pub line_height: f32,
    pub big_text_size: f32,
    pub small_text_size: f32,
}

impl Layout {
    /// Resolve as métricas para o formato dado.
    pub fn for_shape(dimens: &LayoutDimens, shape: ScreenShape) -> Self {
        let round = shape == ScreenShape::Round;
        Self {
            shape,
            x_offset: if round {
                dimens.x_offset_round
            } else {
                dimens.x_offset
            },
            y_offset: dimens.y_offset,
            line_height: dimens.line_height,
            big_text_size: if round {
                dimens.big_text_size_round
            } else {
                dimens.big_text_size
            },
            small_text_size: if round {
                dimens.small_text_size_round
            } else {
                dimens.small_text_size
            },
        }
    }
}
