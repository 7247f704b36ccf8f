//! # Módulo HTTP
//!
//! Protocolo mínimo tipo HTTP/1.0 para servir archivos:
//!
//! - Un único método (`GET`)
//! - Una petición por conexión, sin keep-alive ni chunked encoding
//! - El header termina con una línea vacía (`\r\n\r\n`)
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <bytes del archivo>
//! ```

pub mod request;   // Lectura del header y parsing de la request line
pub mod response;  // Cabecera de las respuestas
pub mod status;    // Códigos de estado HTTP

pub use request::{normalize_path, HeaderBuffer, Method, Request};
pub use response::Response;
pub use status::StatusCode;
