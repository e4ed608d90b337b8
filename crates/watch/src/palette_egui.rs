//! Conversão dos paints do engine para tipos egui.

use egui::Color32;
use tempo_core::engine::{Paint, Rgb};

/// Cor opaca do fundo.
pub fn rgb_color(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

/// Cor de texto com o alpha do modo atual (mute reduz contraste).
pub fn paint_color(p: &Paint) -> Color32 {
    Color32::from_rgba_unmultiplied(p.color.r, p.color.g, p.color.b, p.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_color_carries_alpha() {
        let p = Paint {
            color: Rgb { r: 10, g: 20, b: 30 },
            alpha: 100,
            anti_alias: true,
            bold: false,
        };
        let c = paint_color(&p);
        assert_eq!(c.a(), 100);
    }
}
