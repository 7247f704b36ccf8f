//! # Lectura y Parsing de Requests
//! src/http/request.rs
//!
//! ## Formato aceptado
//!
//! ```text
//! GET /path/al/archivo HTTP/1.0\r\n
//! Host: localhost:8000\r\n
//! \r\n
//! ```
//!
//! Solo se consumen el método y el path. El resto de los headers se lee
//! (para encontrar `\r\n\r\n`) y se descarta.

use crate::error::{Framing, ServeError};
use std::io::{self, Read};

/// Fin del header: línea vacía
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Tamaño de cada `read` sobre el socket
const READ_CHUNK: usize = 4096;

/// Único método soportado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un archivo
    GET,
}

impl Method {
    /// Token tal como aparece en la request line, incluyendo el espacio
    const PREFIX: &'static [u8] = b"GET ";

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

/// Buffer acotado donde se acumula el header del request
///
/// Lleva su propia longitud y busca el terminador de forma explícita;
/// nunca se interpreta como string terminado en nulo.
#[derive(Debug)]
pub struct HeaderBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl HeaderBuffer {
    /// Crea un buffer vacío que no crecerá más allá de `limit` bytes
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(limit.min(READ_CHUNK)),
            limit,
        }
    }

    /// Lee del `reader` hasta encontrar `\r\n\r\n`
    ///
    /// Retorna la longitud del header incluyendo el terminador. Los bytes
    /// que hayan llegado después del terminador quedan en el buffer y se
    /// ignoran.
    ///
    /// # Errores
    ///
    /// * `Framing::PeerClosed` - `read` retornó 0 antes del terminador
    /// * `Framing::BufferExhausted` - se alcanzó `limit` sin terminador
    /// * `Framing::ReadFailed` - el socket reportó un error
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> Result<usize, ServeError> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut scanned = 0;

        loop {
            if let Some(pos) = self.find_terminator(scanned) {
                return Ok(pos + HEADER_TERMINATOR.len());
            }
            // El terminador puede quedar partido entre dos lecturas
            scanned = self.data.len().saturating_sub(HEADER_TERMINATOR.len() - 1);

            let room = self.limit - self.data.len();
            if room == 0 {
                return Err(ServeError::Framing(Framing::BufferExhausted { limit: self.limit }));
            }

            let want = room.min(chunk.len());
            match reader.read(&mut chunk[..want]) {
                Ok(0) => return Err(ServeError::Framing(Framing::PeerClosed)),
                Ok(n) => self.data.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ServeError::Framing(Framing::ReadFailed(e))),
            }
        }
    }

    /// Posición del primer `\r\n\r\n` a partir de `from`
    pub fn find_terminator(&self, from: usize) -> Option<usize> {
        if from >= self.data.len() {
            return None;
        }
        self.data[from..]
            .windows(HEADER_TERMINATOR.len())
            .position(|w| w == HEADER_TERMINATOR)
            .map(|p| p + from)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

}

/// Request parseado; vive solo durante una invocación del handler
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path ya normalizado (sin `/` final, sin segmentos `..`)
    path: String,

    /// Headers crudos después de la request line (se descartan)
    raw_headers: Vec<u8>,
}

impl Request {
    /// Parsea el header completo (incluyendo `\r\n\r\n`)
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use file_server::http::Request;
    ///
    /// let request = Request::parse(b"GET /docs/ HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(request.path(), "/docs");
    /// ```
    pub fn parse(head: &[u8]) -> Result<Self, ServeError> {
        let line_end = head
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(head.len());
        let line = &head[..line_end];

        if !line.starts_with(Method::PREFIX) {
            return Err(ServeError::InvalidMethod(
                String::from_utf8_lossy(line).into_owned(),
            ));
        }

        let rest = &line[Method::PREFIX.len()..];
        let path_end = rest
            .iter()
            .position(|&b| b == b' ')
            .ok_or(ServeError::MalformedRequest)?;
        if path_end == 0 {
            return Err(ServeError::MalformedRequest);
        }

        let raw_path = std::str::from_utf8(&rest[..path_end])
            .map_err(|_| ServeError::MalformedRequest)?;
        let path = normalize_path(raw_path)?;

        let headers_start = (line_end + 2).min(head.len());

        Ok(Request {
            method: Method::GET,
            path,
            raw_headers: head[headers_start..].to_vec(),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path normalizado, relativo a la raíz servida
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_headers(&self) -> &[u8] {
        &self.raw_headers
    }
}

/// Normaliza el path del request y rechaza cualquier intento de salir de
/// la raíz
///
/// - Quita el `/` final (salvo que el path sea exactamente `/`).
/// - Rechaza con `PathTraversal` cualquier segmento `..`, separando tanto
///   por `/` como por `\`.
///
/// No toca el sistema de archivos.
pub fn normalize_path(raw: &str) -> Result<String, ServeError> {
    let mut path = raw;
    if path.len() > 1 && path.ends_with('/') {
        path = &path[..path.len() - 1];
    }

    if path.split(|c| c == '/' || c == '\\').any(|segment| segment == "..") {
        return Err(ServeError::PathTraversal(raw.to_string()));
    }

    Ok(path.to_string())
}
