//! Mostrador principal – App eframe/egui.
//!
//! Este é o adapter fino entre o host (janela, teclado) e a máquina de
//! estados em `tempo_core::engine`: sinais do host viram transições
//! nomeadas, o plano de desenho do engine vira chamadas de painter, e o
//! repaint é agendado com o atraso alinhado à fase do relógio.

use crate::assets::{self, AssetMessage};
use crate::listener::Listener;
use crate::palette_egui::{paint_color, rgb_color};
use chrono::Local;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::Duration;
use tempo_core::config::AppConfig;
use tempo_core::engine::{Anchor, DrawItem, WatchEngine, MUTE_UPDATE_RATE_MS};
use tempo_core::layout::ScreenShape;
use tracing::{info, warn};

/// Estado do mostrador.
pub struct WatchFace {
    config: AppConfig,
    engine: WatchEngine,

    // Conexão de transporte (segue o ciclo de visibilidade)
    listener: Option<Listener>,

    // Resultados de fetch de asset
    asset_tx: Sender<AssetMessage>,
    asset_rx: Receiver<AssetMessage>,
    texture: Option<egui::TextureHandle>,

    // Sinais de capacidade simulados pelo teclado
    low_bit: bool,
    burn_in: bool,
    is_fullscreen: bool,
}

impl WatchFace {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let engine = WatchEngine::new(&config.watch);
        let (asset_tx, asset_rx) = bounded::<AssetMessage>(8);

        Self {
            config,
            engine,
            listener: None,
            asset_tx,
            asset_rx,
            texture: None,
            low_bit: false,
            burn_in: false,
            is_fullscreen: false,
        }
    }

    /// Abre a conexão de escuta. Idempotente: se já existe, não reabre.
    fn connect(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let cfg = &self.config.watch;
        match Listener::spawn(
            cfg.port,
            cfg.peers.clone(),
            Duration::from_secs_f64(cfg.snapshot_wait_secs),
        ) {
            Ok(listener) => self.listener = Some(listener),
            Err(e) => {
                // Sem retry explícito: o próximo ciclo de visibilidade tenta de novo
                warn!("Falha ao abrir listener na porta {}: {e}", cfg.port);
            }
        }
    }

    /// Derruba a conexão. O Drop encerra a thread e solta o socket, então
    /// um connect imediato na mesma porta funciona.
    fn disconnect(&mut self) {
        if self.listener.take().is_some() {
            info!("Conexão de transporte fechada");
        }
    }

    /// Processa mensagens pendentes da thread de escuta.
    fn poll_network(&mut self, ctx: &egui::Context) {
        let Some(listener) = &self.listener else {
            return;
        };
        let messages: Vec<_> = listener.rx().try_iter().collect();

        for msg in messages {
            info!(
                "Config de {} ({} bytes, seq {})",
                msg.source_addr, msg.raw_size, msg.delta.seq
            );
            if let Some(handle) = self.engine.apply(&msg.delta) {
                // Resolução de asset nunca roda na thread de render
                assets::spawn_fetch(
                    handle,
                    msg.delta.seq,
                    msg.source_addr,
                    Duration::from_secs_f64(self.config.watch.asset_timeout_secs),
                    self.asset_tx.clone(),
                );
            }
        }

        while let Ok(msg) = self.asset_rx.try_recv() {
            if self.engine.apply_asset(msg.seq, msg.image.clone()) {
                let size = [msg.image.width as usize, msg.image.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &msg.image.rgba);
                self.texture =
                    Some(ctx.load_texture("weather", color_image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Sinais do host simulados pelo teclado (adapter de demonstração).
    fn poll_host_signals(&mut self, ctx: &egui::Context) {
        ctx.input(|i: &egui::InputState| {
            if i.key_pressed(egui::Key::A) {
                let ambient = !self.engine.is_ambient();
                self.engine.set_ambient(ambient);
            }
            if i.key_pressed(egui::Key::M) {
                let mute = !self.engine.is_mute();
                self.engine.set_mute(mute);
            }
            if i.key_pressed(egui::Key::L) {
                self.low_bit = !self.low_bit;
                self.engine.set_properties(self.low_bit, self.burn_in);
            }
            if i.key_pressed(egui::Key::B) {
                self.burn_in = !self.burn_in;
                self.engine.set_properties(self.low_bit, self.burn_in);
            }
            if i.key_pressed(egui::Key::S) {
                let next = match self.engine.layout().shape {
                    ScreenShape::Round => ScreenShape::Square,
                    ScreenShape::Square => ScreenShape::Round,
                };
                self.engine.set_shape(next);
            }
            if i.key_pressed(egui::Key::Z) {
                self.engine.on_timezone_changed();
            }
            if i.key_pressed(egui::Key::F) || i.key_pressed(egui::Key::F11) {
                self.is_fullscreen = !self.is_fullscreen;
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
            }
            if i.key_pressed(egui::Key::Q) || i.key_pressed(egui::Key::Escape) {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    /// Traduz o plano de desenho em chamadas de painter.
    fn render(&self, ui: &mut egui::Ui) {
        let now = Local::now().naive_local();
        let plan = self.engine.draw_plan(&now);

        let rect = ui.max_rect();
        let painter = ui.painter();
        let center_x = rect.center().x;
        let base_y = rect.min.y;

        painter.rect_filled(rect, 0.0, rgb_color(plan.background));

        // Largura medida do item anterior (âncora da temperatura mínima)
        let mut prev_width = 0.0f32;

        for item in &plan.items {
            match item {
                DrawItem::Text {
                    content,
                    paint,
                    size,
                    anchor,
                    ..
                } => {
                    let font = egui::FontId::proportional(*size);
                    let color = paint_color(paint);
                    let galley = painter.layout_no_wrap(content.clone(), font, color);
                    let width = galley.size().x;

                    let (x, y) = match anchor {
                        Anchor::Centered { y } => (center_x - width / 2.0, *y),
                        Anchor::FromCenter { dx, y } => (center_x + dx, *y),
                        Anchor::AfterPrevious { margin, y } => {
                            (center_x + prev_width + margin, *y)
                        }
                    };
                    let pos = egui::pos2(x, base_y + y);

                    if paint.bold {
                        // Negrito sintético: as fontes padrão do egui não
                        // trazem peso bold, então o texto é pintado duas
                        // vezes com meio pixel de deslocamento
                        painter.galley(pos + egui::vec2(0.6, 0.0), galley.clone(), color);
                    }
                    painter.galley(pos, galley, color);
                    prev_width = width;
                }
                DrawItem::Image { dx, y, size } => {
                    if let Some(texture) = &self.texture {
                        let min = egui::pos2(center_x + dx, base_y + y);
                        let image_rect =
                            egui::Rect::from_min_size(min, egui::vec2(*size, *size));
                        let uv =
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                        painter.image(texture.id(), image_rect, uv, egui::Color32::WHITE);
                    }
                }
            }
        }
    }
}

impl eframe::App for WatchFace {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Visibilidade (minimizar = superfície invisível) ──
        let visible = !ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        let was_visible = self.engine.is_visible();
        if visible != was_visible {
            self.engine.set_visible(visible);
            if visible {
                self.connect();
            } else {
                self.disconnect();
            }
        }

        // ── Sinais do host e dados ──
        self.poll_host_signals(ctx);
        self.poll_network(ctx);

        // ── Anti-aliasing segue a capacidade low-bit no ambient ──
        let anti_alias = self.engine.paints().time.anti_alias;
        ctx.tessellation_options_mut(|opts| opts.feathering = anti_alias);

        // ── Mostrador ──
        let background = rgb_color(self.engine.paints().background);
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(background))
            .show(ctx, |ui: &mut egui::Ui| {
                self.render(ui);
            });

        // ── Agendamento do próximo frame ──
        if self.engine.take_redraw() {
            ctx.request_repaint();
        }
        let now_ms = Local::now().timestamp_millis().max(0) as u64;
        if self.engine.timer_running() {
            let delay = self.engine.next_tick_delay_ms(now_ms);
            ctx.request_repaint_after(Duration::from_millis(delay));
        } else if self.engine.is_visible() {
            // Ambient: sem timer próprio; o tick de minuto do host vira
            // um repaint alinhado à virada do minuto
            let delay = MUTE_UPDATE_RATE_MS - (now_ms % MUTE_UPDATE_RATE_MS);
            ctx.request_repaint_after(Duration::from_millis(delay));
        }
    }
}
