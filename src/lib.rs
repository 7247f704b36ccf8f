//! # File Server
//! src/lib.rs
//!
//! Servidor de archivos HTTP/1.0 concurrente: un thread acepta conexiones
//! y las encola en una cola acotada; un pool fijo de workers las atiende.
//!
//! ## Arquitectura
//!
//! ```text
//! Acceptor → submit → TaskQueue → worker libre → ConnectionHandler → close
//! ```
//!
//! - `http`: lectura del header, parsing de la request line, respuestas
//! - `pool`: cola acotada (backpressure) y pool de workers
//! - `server`: socket de escucha, acceptor y handler de conexiones
//! - `config`: configuración desde CLI / variables de entorno
//! - `error`: taxonomía de errores
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::Config;
//! use file_server::server::Server;
//!
//! let server = Server::bind(Config::default()).expect("bind failed");
//! server.run().expect("acceptor stopped");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod pool;
pub mod server;

pub use error::{Framing, ServeError};
