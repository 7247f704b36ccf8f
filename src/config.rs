//! # Configuración del Servidor
//! src/config.rs
//!
//! Valores fijos que se leen una sola vez al arrancar, desde argumentos
//! CLI o variables de entorno. No hay reconfiguración en caliente.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server --port 8000 \
//!   --root ./public \
//!   --workers 16 \
//!   --queue-capacity 256
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! FILE_SERVER_PORT=8080 FILE_SERVER_ROOT=/srv/www ./file_server
//! ```

use clap::Parser;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

/// Tamaño máximo del header por defecto (1 MiB)
pub const DEFAULT_MAX_HEADER_BYTES: usize = 1 << 20;

/// Tamaño de cada pedazo del archivo enviado al socket (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor de archivos HTTP/1.0 con pool de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// IP (IPv4) en la que escucha
    #[arg(long, default_value = "127.0.0.1", env = "FILE_SERVER_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "FILE_SERVER_PORT")]
    pub port: u16,

    /// Directorio raíz que se sirve
    #[arg(short, long, default_value = ".", env = "FILE_SERVER_ROOT")]
    pub root: PathBuf,

    /// Backlog del socket de escucha
    #[arg(long, default_value = "20", env = "BACKLOG")]
    pub backlog: u32,

    // === Pool ===

    /// Número de workers
    #[arg(short, long, default_value = "200", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar en la cola
    #[arg(long = "queue-capacity", default_value = "1024", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Buffers ===

    /// Máximo de bytes que se leen buscando el fin del header
    #[arg(long = "max-header-bytes", default_value = "1048576", env = "MAX_HEADER_BYTES")]
    pub max_header_bytes: usize,

    /// Tamaño de cada escritura del body
    #[arg(long = "chunk-size", default_value = "1048576", env = "CHUNK_SIZE")]
    pub chunk_size: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dirección de bind ya parseada; solo IPv4
    pub fn socket_addr(&self) -> Result<SocketAddrV4, String> {
        let ip: Ipv4Addr = self
            .host
            .parse()
            .map_err(|_| format!("Host must be an IPv4 address, got '{}'", self.host))?;
        Ok(SocketAddrV4::new(ip, self.port))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        self.socket_addr()?;

        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.backlog == 0 {
            return Err("Backlog must be >= 1".to_string());
        }

        // Tiene que caber al menos "\r\n\r\n"
        if self.max_header_bytes < 4 {
            return Err("Max header bytes must be >= 4".to_string());
        }
        if self.chunk_size == 0 {
            return Err("Chunk size must be >= 1".to_string());
        }

        if !self.root.is_dir() {
            return Err(format!("Root '{}' is not a directory", self.root.display()));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              File Server HTTP/1.0 Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Backlog:      {}", self.backlog);
        println!("   Root:         {}", self.root.display());
        println!();
        println!("👷 Worker Pool:");
        println!("   Workers:      {}", self.workers);
        println!("   Queue cap:    {}", self.queue_capacity);
        println!();
        println!("📦 Buffers:");
        println!("   Max header:   {} bytes", self.max_header_bytes);
        println!("   Chunk size:   {} bytes", self.chunk_size);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            root: PathBuf::from("."),
            backlog: 20,
            workers: 200,
            queue_capacity: 1024,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.backlog, 20);
        assert_eq!(config.workers, 200);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.max_header_bytes, 1_048_576);
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8000");
        assert_eq!(
            config.socket_addr().unwrap(),
            SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8000)
        );
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_parse_cli_args() {
        let config = Config::try_parse_from([
            "file_server",
            "--port", "9000",
            "--host", "0.0.0.0",
            "--workers", "8",
            "--queue-capacity", "16",
            "--root", "/tmp",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.root, PathBuf::from("/tmp"));
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = Config::default();
        config.workers = 0;
        let result = config.validate();
        assert!(result.unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_invalid_queue_capacity() {
        let mut config = Config::default();
        config.queue_capacity = 0;
        assert!(config.validate().unwrap_err().contains("Queue capacity"));
    }

    #[test]
    fn test_validate_invalid_backlog() {
        let mut config = Config::default();
        config.backlog = 0;
        assert!(config.validate().unwrap_err().contains("Backlog"));
    }

    #[test]
    fn test_validate_header_limit_fits_terminator() {
        let mut config = Config::default();
        config.max_header_bytes = 3;
        assert!(config.validate().unwrap_err().contains("Max header"));

        config.max_header_bytes = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().unwrap_err().contains("Chunk size"));
    }

    #[test]
    fn test_validate_invalid_host() {
        let mut config = Config::default();
        config.host = "localhost".to_string();
        assert!(config.validate().unwrap_err().contains("IPv4"));
    }

    #[test]
    fn test_validate_missing_root() {
        let mut config = Config::default();
        config.root = PathBuf::from("/definitely/not/here/file_server");
        assert!(config.validate().unwrap_err().contains("not a directory"));
    }

    #[test]
    fn test_config_print_summary() {
        // Should not panic
        Config::default().print_summary();
    }
}
