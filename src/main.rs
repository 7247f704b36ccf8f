//! # File Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, abre el socket y corre el acceptor para
//! siempre. Solo un fallo de bind termina el proceso con error.

use file_server::config::Config;
use file_server::server::Server;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let config = Config::new();
    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(2);
    }

    config.print_summary();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "💥 Error fatal");
            std::process::exit(1);
        }
    };

    // Solo retorna si el listener falla
    if let Err(e) = server.run() {
        error!(error = %e, "💥 El acceptor se detuvo");
        server.pool().shutdown();
        std::process::exit(1);
    }
    server.pool().shutdown();
}
