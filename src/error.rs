//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía única de errores. Los errores de parsing y de resolución
//! quedan contenidos dentro de una conexión: se traducen a una respuesta
//! de error (o a un cierre silencioso) y nunca llegan al loop del worker
//! como algo fatal.

use crate::http::StatusCode;
use std::io;
use std::path::PathBuf;

/// Motivo por el que no se pudo delimitar el header del request
#[derive(Debug)]
pub enum Framing {
    /// El peer cerró la conexión antes de enviar `\r\n\r\n`
    PeerClosed,

    /// `read` falló sobre el socket
    ReadFailed(io::Error),

    /// Se llenó el buffer sin encontrar el terminador
    BufferExhausted { limit: usize },
}

/// Errores que pueden ocurrir al servir una conexión o al usar el pool
#[derive(Debug)]
pub enum ServeError {
    /// La request line no empieza con el único método soportado
    InvalidMethod(String),

    /// Falta el espacio que termina el path, o la línea no es UTF-8
    MalformedRequest,

    /// El path contiene un segmento `..`
    PathTraversal(String),

    /// El archivo no existe bajo la raíz
    NotFound(PathBuf),

    /// El path resuelve a un directorio (no se sirven listados)
    IsDirectory(PathBuf),

    /// Falla de open/stat/read/write
    Io(io::Error),

    /// Se intentó encolar después de `shutdown()`
    PoolClosed,

    /// El header nunca terminó
    Framing(Framing),
}

impl ServeError {
    /// Status con el que se responde al cliente
    ///
    /// `None` significa que no hay una respuesta segura que construir y la
    /// conexión se cierra sin escribir nada.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServeError::InvalidMethod(_) => Some(StatusCode::InternalServerError),
            ServeError::MalformedRequest => Some(StatusCode::BadRequest),
            ServeError::PathTraversal(_) => Some(StatusCode::Forbidden),
            ServeError::NotFound(_) => Some(StatusCode::NotFound),
            ServeError::IsDirectory(_) => Some(StatusCode::InternalServerError),
            ServeError::Io(_) => Some(StatusCode::InternalServerError),
            ServeError::Framing(Framing::BufferExhausted { .. }) => Some(StatusCode::BadRequest),
            ServeError::Framing(Framing::PeerClosed) => None,
            ServeError::Framing(Framing::ReadFailed(_)) => None,
            ServeError::PoolClosed => None,
        }
    }
}

impl std::fmt::Display for ServeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeError::InvalidMethod(line) => write!(f, "Unsupported method in request line: {:?}", line),
            ServeError::MalformedRequest => write!(f, "Malformed request line"),
            ServeError::PathTraversal(path) => write!(f, "Path traversal attempt: {}", path),
            ServeError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            ServeError::IsDirectory(path) => write!(f, "Requested resource is a directory: {}", path.display()),
            ServeError::Io(e) => write!(f, "I/O error: {}", e),
            ServeError::PoolClosed => write!(f, "Worker pool is closed"),
            ServeError::Framing(Framing::PeerClosed) => {
                write!(f, "Peer closed the connection before the end of the header")
            }
            ServeError::Framing(Framing::ReadFailed(e)) => {
                write!(f, "Failed to read request header: {}", e)
            }
            ServeError::Framing(Framing::BufferExhausted { limit }) => {
                write!(f, "Request header exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Io(e) => Some(e),
            ServeError::Framing(Framing::ReadFailed(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServeError {
    fn from(e: io::Error) -> Self {
        ServeError::Io(e)
    }
}
