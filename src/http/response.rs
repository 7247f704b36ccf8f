//! # Construcción de Respuestas HTTP
//!
//! Solo se construye la cabecera (status line + headers + línea vacía).
//! El body de un archivo se transmite aparte, por pedazos, directo desde
//! el archivo al socket.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <13 bytes del archivo>
//! ```
//!
//! Las respuestas de error no llevan body ni `Content-Length`:
//!
//! ```text
//! HTTP/1.0 404 Not Found\r\n
//! \r\n
//! ```

use super::StatusCode;
use std::io::{self, Write};

/// Versión que se escribe en la status line
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// Cabecera de una respuesta HTTP/1.0
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en el orden en que se agregaron
    headers: Vec<(String, String)>,
}

impl Response {
    /// Crea una respuesta sin headers
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Agrega un header; si ya existe, se reemplaza su valor
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    fn add_header(&mut self, name: &str, value: &str) {
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            entry.1 = value.to_string();
        } else {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    /// Respuesta 200 para un archivo de `len` bytes
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::Response;
    ///
    /// let head = Response::file(5).to_bytes();
    /// assert_eq!(head, b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\n");
    /// ```
    pub fn file(len: u64) -> Self {
        Self::new(StatusCode::Ok).with_header("Content-Length", &len.to_string())
    }

    /// Respuesta de error: solo status line, sin body
    pub fn error(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// Serializa la cabecera completa, terminada en `\r\n\r\n`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(64);

        // 1. Status line
        result.extend_from_slice(format!("{} {}\r\n", HTTP_VERSION, self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        result
    }

    /// Escribe la cabecera completa; `write_all` reintenta escrituras parciales
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Valor de un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
