//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! 1. `listener`: socket de escucha con SO_REUSEADDR y backlog configurable
//! 2. `tcp`: loop de accept que alimenta al pool de workers
//! 3. `handler`: lógica de cada conexión (leer, parsear, resolver, enviar)

pub mod handler;
pub mod listener;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use handler::ConnectionHandler;
pub use tcp::Server;
