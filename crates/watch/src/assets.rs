//! Resolução de assets de imagem fora da thread de render.
//!
//! Cada fetch é uma thread fire-and-forget com request/response explícito
//! e timeout próprio – nada de "await" bloqueante disfarçado no caminho
//! da UI. Falha de fetch ou decodificação é logada e nada é entregue: a
//! imagem anterior do mostrador fica de pé.

use crossbeam_channel::Sender;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tempo_core::protocol::{
    decode_frame, decode_weather_image, encode_frame, AssetHandle, FrameBody,
};
use tempo_core::state::WeatherImage;
use tracing::{debug, info, warn};

/// Resultado de um fetch bem-sucedido, carimbado com a seq de origem.
#[derive(Debug, Clone)]
pub struct AssetMessage {
    pub seq: u64,
    pub image: WeatherImage,
}

/// Dispara a resolução de um asset numa thread de trabalho.
///
/// `seq` é a sequência do payload que carregou o handle; o engine usa o
/// carimbo para descartar resultados obsoletos.
pub fn spawn_fetch(
    handle: AssetHandle,
    seq: u64,
    peer: SocketAddr,
    timeout: Duration,
    tx: Sender<AssetMessage>,
) {
    let spawned = std::thread::Builder::new()
        .name(format!("asset-fetch-{}", handle.id))
        .spawn(move || {
            if let Some(image) = fetch_image(handle, peer, timeout) {
                if tx.try_send(AssetMessage { seq, image }).is_err() {
                    debug!("Channel de assets cheio, descartando imagem");
                }
            }
        });

    if let Err(e) = spawned {
        warn!("Falha ao criar thread de fetch: {e}");
    }
}

/// Request/response bloqueante, confinado à thread de trabalho.
fn fetch_image(handle: AssetHandle, peer: SocketAddr, timeout: Duration) -> Option<WeatherImage> {
    let sock = match UdpSocket::bind("0.0.0.0:0") {
        Ok(s) => s,
        Err(e) => {
            warn!("Fetch do asset {}: sem socket ({e})", handle.id);
            return None;
        }
    };
    if let Err(e) = sock.set_read_timeout(Some(Duration::from_millis(250))) {
        warn!("Fetch do asset {}: timeout não aplicado ({e})", handle.id);
        return None;
    }

    let request = match encode_frame(&FrameBody::AssetRequest { id: handle.id }) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Fetch do asset {}: encode falhou ({e})", handle.id);
            return None;
        }
    };
    if let Err(e) = sock.send_to(&request, peer) {
        warn!("Fetch do asset {}: envio para {peer} falhou ({e})", handle.id);
        return None;
    }

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 65536];
    while Instant::now() < deadline {
        match sock.recv_from(&mut buf) {
            Ok((size, _)) => match decode_frame(&buf[..size]) {
                Ok(FrameBody::AssetResponse { id, bytes }) if id == handle.id => {
                    let Some(bytes) = bytes else {
                        // Handle nulo/indisponível: "sem imagem", não é erro
                        info!("Asset {} indisponível no peer", handle.id);
                        return None;
                    };
                    match decode_weather_image(&bytes) {
                        Ok(image) => {
                            debug!(
                                "Asset {} resolvido: {}x{} ({} bytes)",
                                handle.id,
                                image.width,
                                image.height,
                                bytes.len()
                            );
                            return Some(image);
                        }
                        Err(e) => {
                            warn!("Asset {}: decodificação falhou ({e})", handle.id);
                            return None;
                        }
                    }
                }
                Ok(other) => debug!("Frame inesperado durante fetch: {other:?}"),
                Err(e) => debug!("Frame inválido durante fetch: {e}"),
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => {
                warn!("Fetch do asset {}: erro de socket ({e})", handle.id);
                return None;
            }
        }
    }

    warn!(
        "Fetch do asset {} expirou em {:.1}s",
        handle.id,
        timeout.as_secs_f64()
    );
    None
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use tempo_core::protocol::encode_weather_image;

    /// Peer de mentira que responde um único AssetRequest.
    fn fake_peer(reply: impl FnOnce(u64) -> FrameBody + Send + 'static) -> SocketAddr {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let addr = sock.local_addr().unwrap();

        std::thread::spawn(move || {
            let mut buf = [0u8; 65536];
            if let Ok((size, src)) = sock.recv_from(&mut buf) {
                if let Ok(FrameBody::AssetRequest { id }) = decode_frame(&buf[..size]) {
                    let frame = encode_frame(&reply(id)).unwrap();
                    let _ = sock.send_to(&frame, src);
                }
            }
        });

        addr
    }

    #[test]
    fn fetch_delivers_decoded_image_with_seq() {
        let peer = fake_peer(|id| {
            let image = WeatherImage::solid(60, 60, [255, 200, 0, 255]);
            FrameBody::AssetResponse {
                id,
                bytes: Some(encode_weather_image(&image).unwrap()),
            }
        });

        let (tx, rx) = bounded(4);
        spawn_fetch(AssetHandle { id: 11 }, 42, peer, Duration::from_secs(5), tx);

        let msg = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("imagem não chegou");
        assert_eq!(msg.seq, 42);
        assert_eq!(msg.image.width, 60);
        assert!(msg.image.is_consistent());
    }

    #[test]
    fn null_bytes_deliver_nothing() {
        // Cenário: handle resolve para stream nula → imagem anterior fica
        let peer = fake_peer(|id| FrameBody::AssetResponse { id, bytes: None });

        let (tx, rx) = bounded(4);
        spawn_fetch(AssetHandle { id: 12 }, 1, peer, Duration::from_secs(2), tx);

        assert!(rx.recv_timeout(Duration::from_secs(4)).is_err());
    }

    #[test]
    fn corrupt_bytes_deliver_nothing() {
        let peer = fake_peer(|id| FrameBody::AssetResponse {
            id,
            bytes: Some(vec![0xBA, 0xD0]),
        });

        let (tx, rx) = bounded(4);
        spawn_fetch(AssetHandle { id: 13 }, 1, peer, Duration::from_secs(2), tx);

        assert!(rx.recv_timeout(Duration::from_secs(4)).is_err());
    }

    #[test]
    fn unreachable_peer_times_out_quietly() {
        // Ninguém escutando nessa porta
        let peer: SocketAddr = "127.0.0.1:1".parse().unwrap();

        let (tx, rx) = bounded(4);
        spawn_fetch(AssetHandle { id: 14 }, 1, peer, Duration::from_millis(600), tx);

        assert!(rx.recv_timeout(Duration::from_secs(3)).is_err());
    }
}
