//! Máquina de estados do mostrador e timer de redraw.
//!
//! Modela o Engine do watch face como um objeto explícito com transições
//! nomeadas (`set_visible`, `set_ambient`, `set_mute`…) chamadas por um
//! adapter fino; aqui não existe nada do framework de host. Os três
//! sinais de modo (visível, ambient, mute) são flags independentes que
//! se compõem no visual, não um enum exclusivo.
//!
//! Cadência do timer:
//! - 500 ms no modo interativo (pisca-pisca do relógio)
//! - 60 000 ms em mute ou ambient
//! - o próximo tick é alinhado à fase do relógio de parede:
//!   `intervalo - (agora % intervalo)`
//!
//! Invariante: `timer_running == visível ∧ ¬ambient` (mute só desacelera,
//! não para).

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::layout::{Layout, ScreenShape};
use crate::protocol::AssetHandle;
use crate::state::{ConfigDelta, DisplayConfig, WeatherImage};
use crate::theme::{self, hex_to_rgb, Palette, PaletteColors};

/// Cadência no modo interativo (duas vezes por segundo).
pub const NORMAL_UPDATE_RATE_MS: u64 = 500;

/// Cadência em mute (uma vez por minuto, como no ambient).
pub const MUTE_UPDATE_RATE_MS: u64 = 60_000;

/// Alpha dos textos em mute.
pub const MUTE_ALPHA: u8 = 100;

/// Alpha dos textos fora de mute.
pub const NORMAL_ALPHA: u8 = 255;

/// Lado da caixa da imagem do clima.
pub const IMAGE_BOX_SIZE: f32 = 60.0;

// ──────────────────────────────────────────────
// Paints
// ──────────────────────────────────────────────

/// Cor RGB resolvida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn from_hex(hex: &str) -> Self {
        let (r, g, b) = hex_to_rgb(hex);
        Self { r, g, b }
    }
}

/// Atributos de desenho de um elemento de texto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Rgb,
    pub alpha: u8,
    pub anti_alias: bool,
    pub bold: bool,
}

/// Paints do frame atual, derivados do modo composto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintSet {
    pub background: Rgb,
    pub time: Paint,
    pub date: Paint,
    pub max_temp: Paint,
    pub min_temp: Paint,
}

// ──────────────────────────────────────────────
// Plano de desenho
// ──────────────────────────────────────────────

/// Papel de um texto no mostrador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Time,
    Date,
    MaxTemp,
    MinTemp,
}

/// Âncora horizontal de um item (o y é sempre absoluto).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Centrado na tela.
    Centered { y: f32 },
    /// Borda esquerda em `centro + dx` (alinhado à esquerda).
    FromCenter { dx: f32, y: f32 },
    /// Começa em `centro + largura medida do item anterior + margin`.
    /// A medição é responsabilidade do adapter (depende da fonte real).
    AfterPrevious { margin: f32, y: f32 },
}

/// Um item do plano de desenho, na ordem de pintura.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Text {
        role: TextRole,
        content: String,
        paint: Paint,
        size: f32,
        anchor: Anchor,
    },
    /// Imagem do clima escalada para a caixa fixa de 60×60.
    Image { dx: f32, y: f32, size: f32 },
}

/// Frame completo: função pura de (agora, config, paints, layout).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPlan {
    pub background: Rgb,
    pub items: Vec<DrawItem>,
}

/// Formata a hora no padrão "h:mm a" (ex: "3:04 PM").
pub fn format_time(now: &NaiveDateTime) -> String {
    now.format("%-I:%M %p").to_string()
}

/// Formata a data no padrão "E, MMM d yyyy" (ex: "Sun, Aug 30 2026").
pub fn format_date(now: &NaiveDateTime) -> String {
    now.format("%a, %b %-d %Y").to_string()
}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

/// Máquina de estados do mostrador.
pub struct WatchEngine {
    palette: Palette,
    dimens: crate::config::LayoutDimens,
    layout: Layout,

    // Sinais de modo (independentes, compostos no visual)
    visible: bool,
    ambient: bool,
    mute: bool,

    // Capacidades do display
    low_bit_ambient: bool,
    burn_in_protection: bool,

    /// 500 ms normal, 60 000 ms em mute.
    interactive_update_rate_ms: u64,

    config: DisplayConfig,
    /// Seq do último payload que carregou um asset de imagem; resultados
    /// de fetch com seq diferente são descartados como obsoletos.
    last_asset_seq: Option<u64>,

    needs_redraw: bool,
}

impl WatchEngine {
    pub fn new(cfg: &WatchConfig) -> Self {
        let shape = ScreenShape::from_name(&cfg.shape);
        Self {
            palette: theme::get_palette(&cfg.palette),
            layout: Layout::for_shape(&cfg.dimens, shape),
            dimens: cfg.dimens.clone(),
            visible: false,
            ambient: false,
            mute: false,
            low_bit_ambient: false,
            burn_in_protection: false,
            interactive_update_rate_ms: NORMAL_UPDATE_RATE_MS,
            config: DisplayConfig::default(),
            last_asset_seq: None,
            needs_redraw: true,
        }
    }

    // ── Transições chamadas pelo adapter ──

    /// Superfície ficou visível/invisível. O adapter abre a conexão de
    /// transporte no visível=true e fecha no false; aqui só o timer muda.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        info!("Visibilidade: {visible}");
        self.visible = visible;
        if visible {
            // Fuso/locale podem ter mudado enquanto invisível
            self.needs_redraw = true;
        }
    }

    /// Entrada/saída do modo ambient: troca de paleta + timer.
    pub fn set_ambient(&mut self, ambient: bool) {
        if self.ambient == ambient {
            return;
        }
        info!("Modo ambient: {ambient}");
        self.ambient = ambient;
        self.needs_redraw = true;
    }

    /// Filtro de interrupção (mute): desacelera o timer e reduz contraste.
    pub fn set_mute(&mut self, mute: bool) {
        let rate = if mute {
            MUTE_UPDATE_RATE_MS
        } else {
            NORMAL_UPDATE_RATE_MS
        };
        self.interactive_update_rate_ms = rate;

        if self.mute != mute {
            info!("Mute: {mute}");
            self.mute = mute;
            self.needs_redraw = true;
        }
    }

    /// Capacidades do display reportadas pelo host.
    pub fn set_properties(&mut self, low_bit_ambient: bool, burn_in_protection: bool) {
        debug!("Propriedades: low_bit={low_bit_ambient} burn_in={burn_in_protection}");
        self.low_bit_ambient = low_bit_ambient;
        self.burn_in_protection = burn_in_protection;
        self.needs_redraw = true;
    }

    /// Mudança de formato de tela (round/square). Idempotente.
    pub fn set_shape(&mut self, shape: ScreenShape) {
        let layout = Layout::for_shape(&self.dimens, shape);
        if layout != self.layout {
            self.layout = layout;
            self.needs_redraw = true;
        }
    }

    /// Fuso horário ou locale mudou: só força um redraw.
    pub fn on_timezone_changed(&mut self) {
        self.needs_redraw = true;
    }

    // ── Pipeline de config ──

    /// Aplica um delta parcial de config. Se o delta carrega um asset de
    /// imagem, retorna o handle para o adapter resolver fora da thread de
    /// render; caso contrário o redraw já fica pendente aqui.
    pub fn apply(&mut self, delta: &ConfigDelta) -> Option<AssetHandle> {
        let changed = self.config.apply(delta);
        if changed {
            self.needs_redraw = true;
        }

        if let Some(handle) = delta.weather_asset {
            self.last_asset_seq = Some(delta.seq);
            Some(handle)
        } else {
            None
        }
    }

    /// Entrega o resultado de um fetch de asset. Resultados obsoletos
    /// (seq diferente do último handle visto) são descartados.
    pub fn apply_asset(&mut self, seq: u64, image: WeatherImage) -> bool {
        if self.last_asset_seq != Some(seq) {
            debug!(
                "Descartando asset obsoleto (seq {seq}, atual {:?})",
                self.last_asset_seq
            );
            return false;
        }
        self.config.set_image(image);
        self.needs_redraw = true;
        true
    }

    // ── Timer ──

    /// O timer só roda visível e fora do ambient.
    pub fn timer_running(&self) -> bool {
        self.visible && !self.ambient
    }

    /// Intervalo efetivo do redraw periódico.
    pub fn interval_ms(&self) -> u64 {
        if self.ambient {
            MUTE_UPDATE_RATE_MS
        } else {
            self.interactive_update_rate_ms
        }
    }

    /// Atraso até o próximo tick, alinhado à fase do relógio de parede
    /// para o minuto virar em sincronia com o relógio real.
    pub fn next_tick_delay_ms(&self, now_ms: u64) -> u64 {
        let interval = self.interval_ms();
        interval - (now_ms % interval)
    }

    /// Consome o pedido de redraw pendente.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // ── Estado derivado ──

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    pub fn is_mute(&self) -> bool {
        self.mute
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn display_config(&self) -> &DisplayConfig {
        &self.config
    }

    fn mode_colors(&self) -> &PaletteColors {
        if self.ambient {
            &self.palette.ambient
        } else {
            &self.palette.interactive
        }
    }

    /// Deriva os paints do modo composto atual:
    /// - ambient troca o conjunto de cores
    /// - mute aplica alpha reduzido em hora/data/máxima
    /// - low-bit desliga anti-alias só no ambient
    /// - burn-in força a hora em peso normal (sem bold)
    pub fn paints(&self) -> PaintSet {
        let colors = self.mode_colors();
        let alpha = if self.mute { MUTE_ALPHA } else { NORMAL_ALPHA };
        let anti_alias = !(self.low_bit_ambient && self.ambient);

        let text = |color: &str, alpha: u8, bold: bool| Paint {
            color: Rgb::from_hex(color),
            alpha,
            anti_alias,
            bold,
        };

        PaintSet {
            background: Rgb::from_hex(&colors.background),
            time: text(&colors.time, alpha, !self.burn_in_protection),
            date: text(&colors.date, alpha, false),
            max_temp: text(&colors.max_temp, alpha, !self.burn_in_protection),
            // A mínima não entra no blend de mute (como no original)
            min_temp: text(&colors.min_temp, NORMAL_ALPHA, false),
        }
    }

    /// Monta o plano de desenho do frame: fundo, hora, data, imagem do
    /// clima (se houver) e temperaturas, de cima para baixo. Função pura
    /// de (agora, config, paints, layout); nunca desenha "null" – string
    /// vazia é o piso das temperaturas.
    pub fn draw_plan(&self, now: &NaiveDateTime) -> DrawPlan {
        let paints = self.paints();
        let l = &self.layout;
        let mut items = Vec::with_capacity(5);

        items.push(DrawItem::Text {
            role: TextRole::Time,
            content: format_time(now),
            paint: paints.time,
            size: l.big_text_size,
            anchor: Anchor::Centered { y: l.y_offset },
        });

        items.push(DrawItem::Text {
            role: TextRole::Date,
            content: format_date(now),
            paint: paints.date,
            size: l.small_text_size,
            anchor: Anchor::Centered {
                y: l.y_offset + l.line_height + 10.0,
            },
        });

        if self.config.weather_image.is_some() {
            items.push(DrawItem::Image {
                dx: -90.0,
                y: l.y_offset + l.line_height * 2.0,
                size: IMAGE_BOX_SIZE,
            });
        }

        let temp_y = l.y_offset + l.line_height * 3.0 + 10.0;
        items.push(DrawItem::Text {
            role: TextRole::MaxTemp,
            content: self.config.max_temp.clone(),
            paint: paints.max_temp,
            size: l.small_text_size,
            anchor: Anchor::FromCenter { dx: 10.0, y: temp_y },
        });
        items.push(DrawItem::Text {
            role: TextRole::MinTemp,
            content: self.config.min_temp.clone(),
            paint: paints.min_temp,
            size: l.small_text_size,
            anchor: Anchor::AfterPrevious {
                margin: 20.0,
                y: temp_y,
            },
        });

        DrawPlan {
            background: paints.background,
            items,
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine() -> WatchEngine {
        WatchEngine::new(&WatchConfig::default())
    }

    fn sample_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 30)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap()
    }

    fn delta(seq: u64, max: Option<&str>, min: Option<&str>) -> ConfigDelta {
        ConfigDelta {
            seq,
            max_temp: max.map(Into::into),
            min_temp: min.map(Into::into),
            weather_asset: None,
        }
    }

    // ── Timer ──

    #[test]
    fn timer_runs_only_visible_and_not_ambient() {
        let mut e = engine();
        assert!(!e.timer_running());

        e.set_visible(true);
        assert!(e.timer_running());

        e.set_ambient(true);
        assert!(!e.timer_running());

        e.set_ambient(false);
        assert!(e.timer_running());

        e.set_visible(false);
        assert!(!e.timer_running());
    }

    #[test]
    fn ambient_while_visible_stops_timer_and_swaps_palette() {
        // Cenário 3
        let mut e = engine();
        e.set_visible(true);
        e.set_ambient(true);

        assert!(!e.timer_running());
        let paints = e.paints();
        let ambient_bg = Rgb::from_hex(&theme::midnight_palette().ambient.background);
        assert_eq!(paints.background, ambient_bg);
    }

    #[test]
    fn mute_slows_but_does_not_stop() {
        // Cenário 4: visível, sem ambient, mute já ativo
        let mut e = engine();
        e.set_mute(true);
        e.set_visible(true);
        e.set_ambient(false);

        assert!(e.timer_running());
        assert_eq!(e.interval_ms(), MUTE_UPDATE_RATE_MS);
    }

    #[test]
    fn interval_invariant() {
        let mut e = engine();
        assert_eq!(e.interval_ms(), NORMAL_UPDATE_RATE_MS);

        e.set_mute(true);
        assert_eq!(e.interval_ms(), MUTE_UPDATE_RATE_MS);

        e.set_mute(false);
        e.set_ambient(true);
        assert_eq!(e.interval_ms(), MUTE_UPDATE_RATE_MS);

        e.set_ambient(false);
        assert_eq!(e.interval_ms(), NORMAL_UPDATE_RATE_MS);
    }

    #[test]
    fn tick_delay_is_phase_aligned() {
        let e = engine();
        // intervalo 500: em t=1230 faltam 270 para a borda de 1500
        assert_eq!(e.next_tick_delay_ms(1230), 270);
        // exatamente na borda o próximo tick é um intervalo inteiro adiante
        assert_eq!(e.next_tick_delay_ms(1500), 500);
    }

    #[test]
    fn tick_delay_in_mute_aligns_to_minute() {
        let mut e = engine();
        e.set_mute(true);
        assert_eq!(e.next_tick_delay_ms(59_000), 1_000);
    }

    // ── Modos e paints ──

    #[test]
    fn mute_applies_alpha_except_min_temp() {
        let mut e = engine();
        e.set_mute(true);
        let paints = e.paints();
        assert_eq!(paints.time.alpha, MUTE_ALPHA);
        assert_eq!(paints.date.alpha, MUTE_ALPHA);
        assert_eq!(paints.max_temp.alpha, MUTE_ALPHA);
        assert_eq!(paints.min_temp.alpha, NORMAL_ALPHA);

        e.set_mute(false);
        assert_eq!(e.paints().time.alpha, NORMAL_ALPHA);
    }

    #[test]
    fn low_bit_disables_anti_alias_only_in_ambient() {
        let mut e = engine();
        e.set_properties(true, false);
        assert!(e.paints().time.anti_alias);

        e.set_ambient(true);
        assert!(!e.paints().time.anti_alias);

        e.set_ambient(false);
        assert!(e.paints().time.anti_alias);
    }

    #[test]
    fn without_low_bit_ambient_keeps_anti_alias() {
        let mut e = engine();
        e.set_ambient(true);
        assert!(e.paints().time.anti_alias);
    }

    #[test]
    fn burn_in_protection_unbolds_time() {
        let mut e = engine();
        assert!(e.paints().time.bold);

        e.set_properties(false, true);
        assert!(!e.paints().time.bold);
        // A data nunca é bold
        assert!(!e.paints().date.bold);
    }

    #[test]
    fn set_shape_is_idempotent() {
        let mut e = engine();
        e.set_shape(ScreenShape::Square);
        let once = *e.layout();
        e.set_shape(ScreenShape::Square);
        assert_eq!(*e.layout(), once);
    }

    #[test]
    fn set_shape_same_value_does_not_request_redraw() {
        let mut e = engine();
        e.set_shape(ScreenShape::Square);
        let _ = e.take_redraw();
        e.set_shape(ScreenShape::Square);
        assert!(!e.take_redraw());
    }

    // ── Pipeline de config ──

    #[test]
    fn apply_requests_redraw_on_change() {
        let mut e = engine();
        let _ = e.take_redraw();

        e.apply(&delta(1, Some("75°"), None));
        assert!(e.take_redraw());
        assert_eq!(e.display_config().max_temp, "75°");
        assert_eq!(e.display_config().min_temp, "");
    }

    #[test]
    fn apply_returns_handle_for_fetch() {
        let mut e = engine();
        let d = ConfigDelta {
            seq: 9,
            weather_asset: Some(AssetHandle { id: 3 }),
            ..Default::default()
        };
        assert_eq!(e.apply(&d), Some(AssetHandle { id: 3 }));
    }

    #[test]
    fn stale_asset_result_is_dropped() {
        let mut e = engine();
        let older = ConfigDelta {
            seq: 1,
            weather_asset: Some(AssetHandle { id: 1 }),
            ..Default::default()
        };
        let newer = ConfigDelta {
            seq: 2,
            weather_asset: Some(AssetHandle { id: 2 }),
            ..Default::default()
        };
        e.apply(&older);
        e.apply(&newer);

        // O fetch do handle antigo termina depois: deve ser descartado
        assert!(!e.apply_asset(1, WeatherImage::solid(2, 2, [0, 0, 0, 255])));
        assert!(e.display_config().weather_image.is_none());

        assert!(e.apply_asset(2, WeatherImage::solid(2, 2, [1, 1, 1, 255])));
        assert!(e.display_config().weather_image.is_some());
    }

    #[test]
    fn text_only_update_keeps_pending_fetch_valid() {
        let mut e = engine();
        e.apply(&ConfigDelta {
            seq: 5,
            weather_asset: Some(AssetHandle { id: 7 }),
            ..Default::default()
        });
        // Um update só de texto não invalida o fetch em voo
        e.apply(&delta(6, Some("80°"), None));
        assert!(e.apply_asset(5, WeatherImage::solid(2, 2, [9, 9, 9, 255])));
    }

    // ── Plano de desenho ──

    #[test]
    fn draw_plan_order_and_floor() {
        let e = engine();
        let plan = e.draw_plan(&sample_now());

        // Sem imagem: hora, data, máxima, mínima
        assert_eq!(plan.items.len(), 4);
        let roles: Vec<_> = plan
            .items
            .iter()
            .map(|i| match i {
                DrawItem::Text { role, .. } => Some(*role),
                DrawItem::Image { .. } => None,
            })
            .collect();
        assert_eq!(
            roles,
            vec![
                Some(TextRole::Time),
                Some(TextRole::Date),
                Some(TextRole::MaxTemp),
                Some(TextRole::MinTemp)
            ]
        );

        // Temperaturas ausentes viram string vazia, nunca "null"
        for item in &plan.items {
            if let DrawItem::Text { role, content, .. } = item {
                if matches!(role, TextRole::MaxTemp | TextRole::MinTemp) {
                    assert_eq!(content, "");
                }
            }
        }
    }

    #[test]
    fn draw_plan_includes_image_box_when_present() {
        // Cenário 5 (metade boa): com imagem aparece a caixa 60×60
        let mut e = engine();
        e.apply(&ConfigDelta {
            seq: 1,
            weather_asset: Some(AssetHandle { id: 1 }),
            ..Default::default()
        });
        e.apply_asset(1, WeatherImage::solid(32, 32, [200, 200, 0, 255]));

        let plan = e.draw_plan(&sample_now());
        assert_eq!(plan.items.len(), 5);
        assert!(matches!(
            plan.items[2],
            DrawItem::Image { size, .. } if size == IMAGE_BOX_SIZE
        ));
    }

    #[test]
    fn failed_fetch_keeps_rendering_without_image() {
        // Cenário 5: fetch falhou (nada entregue), frame segue sem imagem
        let mut e = engine();
        e.apply(&ConfigDelta {
            seq: 1,
            max_temp: Some("75°".into()),
            weather_asset: Some(AssetHandle { id: 1 }),
            ..Default::default()
        });
        let plan = e.draw_plan(&sample_now());
        assert!(plan
            .items
            .iter()
            .all(|i| !matches!(i, DrawItem::Image { .. })));
    }

    #[test]
    fn max_temp_left_edge_starts_right_of_center() {
        // A máxima é alinhada à esquerda a partir de centro + 10; uma
        // string larga cresce para a direita, nunca para cima do centro
        let e = engine();
        let plan = e.draw_plan(&sample_now());
        let max = &plan.items[plan.items.len() - 2];
        assert!(matches!(
            max,
            DrawItem::Text {
                role: TextRole::MaxTemp,
                anchor: Anchor::FromCenter { dx, .. },
                ..
            } if *dx == 10.0
        ));
    }

    #[test]
    fn min_temp_anchors_after_max() {
        let e = engine();
        let plan = e.draw_plan(&sample_now());
        let min = plan.items.last().unwrap();
        assert!(matches!(
            min,
            DrawItem::Text {
                role: TextRole::MinTemp,
                anchor: Anchor::AfterPrevious { margin, .. },
                ..
            } if *margin == 20.0
        ));
    }

    #[test]
    fn time_and_date_formats() {
        let now = sample_now();
        assert_eq!(format_time(&now), "3:04 PM");
        assert_eq!(format_date(&now), "Sun, Aug 30 2026");
    }
}
