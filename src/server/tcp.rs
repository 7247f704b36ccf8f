//! # Acceptor TCP
//! src/server/tcp.rs
//!
//! Un único thread acepta conexiones y las entrega al pool de workers.
//! Si la cola del pool está llena, `submit` bloquea y el acceptor deja de
//! aceptar: es el backpressure esperado, no un error.

use super::handler::ConnectionHandler;
use super::listener::bind_listener;
use crate::config::Config;
use crate::error::ServeError;
use crate::pool::WorkerPool;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pausa tras un error de accept por falta de descriptores/memoria
const RESOURCE_BACKOFF: Duration = Duration::from_millis(50);

/// Servidor de archivos: listener + pool de workers
pub struct Server {
    listener: TcpListener,
    pool: Arc<WorkerPool<TcpStream>>,
}

impl Server {
    /// Abre el socket de escucha e inicia el pool
    ///
    /// Es el único punto fatal del servidor: si el bind falla no hay nada
    /// que servir.
    pub fn bind(config: Config) -> Result<Self, ServeError> {
        let addr = config
            .socket_addr()
            .map_err(|msg| ServeError::Io(io::Error::new(io::ErrorKind::InvalidInput, msg)))?;

        info!("[*] Iniciando servidor en {}", addr);
        let listener = bind_listener(addr, config.backlog)?;

        let handler = ConnectionHandler::from_config(&config);
        let pool = WorkerPool::create(config.workers, config.queue_capacity, move |stream: TcpStream| {
            handler.handle(stream).map(|_| ())
        })?;

        info!(
            address = %listener.local_addr()?,
            root = %config.root.display(),
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "[+] Servidor escuchando"
        );

        Ok(Self {
            listener,
            pool: Arc::new(pool),
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle del pool, para poder hacer `shutdown()` desde otro thread
    pub fn pool(&self) -> Arc<WorkerPool<TcpStream>> {
        Arc::clone(&self.pool)
    }

    /// Loop de accept; no retorna en operación normal
    ///
    /// Retorna `Err` cuando el listener ya no puede aceptar (error fatal)
    /// o cuando el pool fue cerrado y no hay a quién entregar conexiones.
    pub fn run(&self) -> Result<(), ServeError> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "✅ Nueva conexión");
                    if let Err(e) = self.pool.submit(stream) {
                        warn!(%peer, error = %e, "🛑 Pool cerrado, el acceptor se detiene");
                        return Err(e);
                    }
                }
                Err(e) if is_transient(&e) => {
                    warn!(error = %e, "❌ Error al aceptar conexión");
                    if is_resource_exhaustion(&e) {
                        thread::sleep(RESOURCE_BACKOFF);
                    }
                }
                Err(e) => {
                    error!(error = %e, "💥 Falló el listener, el acceptor se detiene");
                    return Err(ServeError::Io(e));
                }
            }
        }
    }
}

/// Errores de accept que afectan a una sola conexión o son momentáneos
fn is_transient(e: &io::Error) -> bool {
    match e.kind() {
        io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::TimedOut => true,
        _ => is_resource_exhaustion(e) || is_pending_network_error(e),
    }
}

/// Errores de red de la conexión pendiente que `accept(2)` entrega tal
/// cual; se reintentan igual que `EAGAIN`
fn is_pending_network_error(e: &io::Error) -> bool {
    let Some(code) = e.raw_os_error() else {
        return false;
    };
    #[cfg(any(target_os = "linux", target_os = "android"))]
    if code == libc::ENONET {
        return true;
    }
    matches!(
        code,
        libc::ENETDOWN
            | libc::EPROTO
            | libc::ENOPROTOOPT
            | libc::EHOSTDOWN
            | libc::EHOSTUNREACH
            | libc::EOPNOTSUPP
            | libc::ENETUNREACH
    )
}

fn is_resource_exhaustion(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS) | Some(libc::ENOMEM)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(is_transient(&io::Error::from_raw_os_error(libc::EMFILE)));
        assert!(is_resource_exhaustion(&io::Error::from_raw_os_error(libc::ENFILE)));
    }

    #[test]
    fn test_pending_network_errors_are_transient() {
        for code in [
            libc::ENETDOWN,
            libc::EPROTO,
            libc::ENOPROTOOPT,
            libc::EHOSTDOWN,
            libc::EHOSTUNREACH,
            libc::EOPNOTSUPP,
            libc::ENETUNREACH,
        ] {
            let e = io::Error::from_raw_os_error(code);
            assert!(is_transient(&e), "{} should be retried", e);
            assert!(!is_resource_exhaustion(&e));
        }

        #[cfg(target_os = "linux")]
        assert!(is_transient(&io::Error::from_raw_os_error(libc::ENONET)));
    }

    #[test]
    fn test_fatal_errors() {
        assert!(!is_transient(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!is_transient(&io::Error::from_raw_os_error(libc::EINVAL)));
        assert!(!is_transient(&io::Error::from_raw_os_error(libc::ENOTSOCK)));
    }

    #[test]
    fn test_bind_rejects_bad_host() {
        let mut config = Config::default();
        config.host = "not-an-ip".to_string();
        assert!(matches!(Server::bind(config), Err(ServeError::Io(_))));
    }

    #[test]
    fn test_run_stops_when_pool_closed() {
        let mut config = Config::default();
        config.port = 0;
        config.workers = 1;
        config.queue_capacity = 1;

        let server = Server::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        server.pool().shutdown();

        let client = thread::spawn(move || TcpStream::connect(addr).map(|_| ()));
        let result = server.run();

        assert!(matches!(result, Err(ServeError::PoolClosed)));
        client.join().unwrap().unwrap();
    }
}
