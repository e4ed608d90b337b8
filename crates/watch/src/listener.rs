//! Thread de escuta que recebe updates de config do phone via UDP.
//!
//! A conexão segue o ciclo de visibilidade do mostrador: é aberta quando
//! a superfície fica visível e derrubada (flag de shutdown) quando some.
//! No (re)connect, um `SnapshotRequest` é enviado a cada peer conhecido;
//! peers que não respondem dentro da espera configurada são pulados sem
//! falhar o startup.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempo_core::protocol::{decode_frame, encode_frame, FrameBody, SYNC_PATH};
use tempo_core::state::ConfigDelta;
use tracing::{debug, error, info, warn};

/// Mensagem enviada da thread de escuta para o adapter.
#[derive(Debug, Clone)]
pub struct NetMessage {
    pub delta: ConfigDelta,
    pub source_addr: SocketAddr,
    pub raw_size: usize,
}

/// Handle da conexão de escuta. Dropar encerra a thread e solta o socket.
pub struct Listener {
    rx: Receiver<NetMessage>,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
    local_port: u16,
}

impl Listener {
    /// Abre o socket, dispara os pedidos de snapshot e inicia a thread.
    ///
    /// Erro de bind volta para o caller: o ciclo de visibilidade tenta de
    /// novo no próximo visível=true (sem backoff explícito).
    pub fn spawn(
        port: u16,
        peers: Vec<String>,
        snapshot_wait: Duration,
    ) -> std::io::Result<Self> {
        let sock = UdpSocket::bind(format!("0.0.0.0:{port}"))?;
        sock.set_read_timeout(Some(Duration::from_millis(500)))?;
        let local_port = sock.local_addr()?.port();

        let (tx, rx) = bounded::<NetMessage>(64); // Buffer de 64 mensagens
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = std::thread::Builder::new()
            .name("udp-listener".into())
            .spawn(move || {
                listener_loop(&sock, &tx, &peers, snapshot_wait, &flag);
            })?;

        Ok(Self {
            rx,
            shutdown,
            handle: Some(handle),
            local_port,
        })
    }

    /// Channel de mensagens decodificadas.
    pub fn rx(&self) -> &Receiver<NetMessage> {
        &self.rx
    }

    /// Porta local efetiva (o SO escolhe quando o bind é na porta 0).
    #[cfg(test)]
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Encerra a thread e espera ela soltar o socket. Sem o join, um
    /// reconnect imediato na mesma porta encontraria o endereço ainda
    /// ocupado (a thread segura o bind até o timeout de leitura).
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Thread do listener terminou em pânico");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listener_loop(
    sock: &UdpSocket,
    tx: &Sender<NetMessage>,
    peers: &[String],
    snapshot_wait: Duration,
    shutdown: &AtomicBool,
) {
    info!(
        "Listener escutando em 0.0.0.0:{} – {} peer(s)",
        sock.local_addr().map(|a| a.port()).unwrap_or(0),
        peers.len()
    );

    // Best-effort: pede o snapshot atual a cada peer conhecido
    let request = match encode_frame(&FrameBody::SnapshotRequest {
        path: SYNC_PATH.into(),
    }) {
        Ok(frame) => frame,
        Err(e) => {
            error!("Falha ao codificar SnapshotRequest: {e}");
            return;
        }
    };
    for peer in peers {
        match sock.send_to(&request, peer) {
            Ok(_) => debug!("SnapshotRequest enviado para {peer}"),
            Err(e) => warn!("Falha ao pedir snapshot de {peer}: {e}"),
        }
    }
    let snapshot_deadline = Instant::now() + snapshot_wait;
    let mut snapshot_seen = peers.is_empty();

    let mut buf = [0u8; 65536];
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Listener encerrado");
            return;
        }

        if !snapshot_seen && Instant::now() >= snapshot_deadline {
            snapshot_seen = true;
            warn!(
                "Nenhum peer respondeu o snapshot em {:.1}s – seguindo com o último estado",
                snapshot_wait.as_secs_f64()
            );
        }

        match sock.recv_from(&mut buf) {
            Ok((size, addr)) => match decode_frame(&buf[..size]) {
                Ok(FrameBody::Config(payload)) => {
                    snapshot_seen = true;
                    let msg = NetMessage {
                        delta: payload.to_delta(),
                        source_addr: addr,
                        raw_size: size,
                    };
                    // Non-blocking send: se a UI está lenta, descarta updates antigos
                    if tx.try_send(msg).is_err() {
                        debug!("Channel cheio, descartando update");
                    }
                }
                Ok(other) => {
                    debug!("Frame inesperado de {addr}: {other:?}");
                }
                Err(e) => {
                    debug!("Frame inválido de {addr}: {e}");
                }
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                // Timeout normal, continua
            }
            Err(e) => {
                warn!("Erro ao receber UDP: {e}");
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
