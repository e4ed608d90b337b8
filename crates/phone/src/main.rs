//! # Tempo Phone
//!
//! Companion que faz o papel do phone pareado: empurra updates de clima
//! para o watch via UDP e atende pedidos de snapshot e de asset no mesmo
//! socket. A sincronização é só de ida (phone → watch); o watch apenas
//! pede snapshot/asset, nunca publica config.

mod forecast;

use forecast::{condition_for_step, icon_for};
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use tempo_core::config::AppConfig;
use tempo_core::protocol::{
    decode_frame, encode_frame, encode_weather_image, AssetHandle, ConfigPayload, FrameBody,
};
use tracing::{debug, error, info, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    for e in config.validate() {
        warn!("Config: {e}");
    }
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let phone_cfg = &config.phone;
    let interval = Duration::from_secs_f64(phone_cfg.push_interval_secs);
    let dest_addr = format!("{}:{}", phone_cfg.dest_ip, phone_cfg.dest_port);

    // ── Socket UDP (pushes + atendimento de requests) ──
    let bind_ip = if phone_cfg.bind_ip.is_empty() {
        "0.0.0.0"
    } else {
        &phone_cfg.bind_ip
    };
    let sock = match UdpSocket::bind(format!("{bind_ip}:{}", phone_cfg.port)) {
        Ok(s) => s,
        Err(e) => {
            error!("Falha ao bind porta {}: {e}", phone_cfg.port);
            return;
        }
    };
    if let Err(e) = sock.set_read_timeout(Some(Duration::from_millis(200))) {
        error!("Falha ao configurar timeout do socket: {e}");
        return;
    }

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⛅ TEMPO PHONE – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Watch:     {dest_addr}");
    println!("  Porta:     {}", phone_cfg.port);
    println!("  Intervalo: {:.1}s", phone_cfg.push_interval_secs);
    println!("  Protocolo: bincode v{}", tempo_core::PROTOCOL_VERSION);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let mut seq: u64 = 0;
    let mut buf = [0u8; 65536];

    loop {
        // Push do passo atual do ciclo de clima
        seq += 1;
        let step = seq;
        let cond = condition_for_step(step);

        // A cada três pushes um vai sem o ícone, exercitando o update
        // parcial no watch (a imagem anterior deve ficar de pé)
        let asset = if step % 3 == 0 {
            None
        } else {
            Some(AssetHandle { id: step })
        };
        let payload = ConfigPayload::from_fields(
            seq,
            Some(cond.max_temp),
            Some(cond.min_temp),
            asset,
        );

        match encode_frame(&FrameBody::Config(payload.clone())) {
            Ok(frame) => match sock.send_to(&frame, &dest_addr) {
                Ok(sent) => info!(
                    "→ {sent} bytes para {dest_addr} | {} | máx {} mín {} | seq {seq}",
                    cond.label, cond.max_temp, cond.min_temp
                ),
                Err(e) => error!("Erro ao enviar UDP: {e}"),
            },
            Err(e) => error!("Erro ao serializar payload: {e}"),
        }

        // Até o próximo push, atende snapshot e asset requests
        let next_push = Instant::now() + interval;
        while Instant::now() < next_push {
            match sock.recv_from(&mut buf) {
                Ok((size, src)) => match decode_frame(&buf[..size]) {
                    Ok(FrameBody::SnapshotRequest { path }) => {
                        debug!("SnapshotRequest de {src} ({path})");
                        reply(&sock, src, &FrameBody::Config(payload.clone()));
                    }
                    Ok(FrameBody::AssetRequest { id }) => {
                        debug!("AssetRequest {id} de {src}");
                        let bytes = encode_weather_image(&icon_for(id)).ok();
                        reply(&sock, src, &FrameBody::AssetResponse { id, bytes });
                    }
                    Ok(other) => debug!("Frame inesperado de {src}: {other:?}"),
                    Err(e) => debug!("Frame inválido de {src}: {e}"),
                },
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    // Timeout normal, continua
                }
                Err(e) => warn!("Erro ao receber UDP: {e}"),
            }
        }
    }
}

fn reply(sock: &UdpSocket, dest: std::net::SocketAddr, body: &FrameBody) {
    match encode_frame(body) {
        Ok(frame) => {
            if let Err(e) = sock.send_to(&frame, dest) {
                warn!("Erro ao responder {dest}: {e}");
            }
        }
        Err(e) => error!("Erro ao serializar resposta: {e}"),
    }
}
