//! # Handler de Conexiones
//! src/server/handler.rs
//!
//! Procesa una conexión completa, en orden:
//!
//! 1. Lee hasta `\r\n\r\n` (con tope de bytes)
//! 2. Parsea la request line (`GET <path> ...`)
//! 3. Normaliza el path y rechaza `..` antes de tocar el disco
//! 4. Abre el archivo bajo la raíz servida
//! 5. Escribe la cabecera y transmite el archivo por pedazos
//!
//! La conexión y el archivo se reciben/abren por valor, así que se cierran
//! exactamente una vez al salir, sea cual sea el camino.

use crate::config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_HEADER_BYTES};
use crate::error::ServeError;
use crate::http::{HeaderBuffer, Request, Response};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Archivo abierto junto con su tamaño
#[derive(Debug)]
pub struct Resource {
    file: File,
    len: u64,
}

impl Resource {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Lógica por conexión, compartida (sin estado mutable) entre workers
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    root: PathBuf,
    max_header_bytes: usize,
    chunk_size: usize,
}

impl ConnectionHandler {
    /// Handler para `root` con los límites por defecto
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.root.clone()).with_limits(config.max_header_bytes, config.chunk_size)
    }

    pub fn with_limits(mut self, max_header_bytes: usize, chunk_size: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Atiende una conexión y la cierra al terminar
    ///
    /// En éxito retorna los bytes de body enviados. Ante un error de
    /// request o de archivo se escribe la respuesta de error que
    /// corresponda (si todavía no se escribió ninguna cabecera) y se
    /// retorna el error para que el worker lo registre.
    pub fn handle<S: Read + Write>(&self, mut stream: S) -> Result<u64, ServeError> {
        let mut head_written = false;
        let result = self.serve(&mut stream, &mut head_written);

        if let Err(e) = &result {
            // Si la cabecera 200 ya salió, no hay respuesta coherente que
            // mandar: solo se cierra
            if let Some(status) = e.status().filter(|_| !head_written) {
                debug!(status = status.as_u16(), error = %e, "↩️  Respuesta de error");
                if let Err(write_err) = Response::error(status)
                    .write_to(&mut stream)
                    .and_then(|_| stream.flush())
                {
                    debug!(error = %write_err, "No se pudo enviar la respuesta de error");
                }
            }
        }

        result
    }

    fn serve<S: Read + Write>(&self, stream: &mut S, head_written: &mut bool) -> Result<u64, ServeError> {
        let mut buffer = HeaderBuffer::new(self.max_header_bytes);
        let head_len = buffer.fill_from(stream)?;

        let request = Request::parse(&buffer.as_bytes()[..head_len])?;
        let resource = self.resolve(&request)?;
        let len = resource.len();

        Response::file(len).write_to(stream)?;
        *head_written = true;

        let sent = self.stream_body(resource, stream)?;
        stream.flush()?;

        info!(method = request.method().as_str(), path = request.path(), bytes = sent, "✅ 200 OK");
        Ok(sent)
    }

    /// Abre el archivo del request bajo la raíz
    ///
    /// El path de un `Request` ya pasó por `normalize_path`, así que no
    /// contiene segmentos `..`.
    pub fn resolve(&self, request: &Request) -> Result<Resource, ServeError> {
        let full_path = self.root.join(request.path().trim_start_matches('/'));

        let file = File::open(&full_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ServeError::NotFound(full_path.clone()),
            _ => ServeError::Io(e),
        })?;

        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(ServeError::IsDirectory(full_path));
        }

        Ok(Resource {
            file,
            len: metadata.len(),
        })
    }

    /// Copia el archivo al socket en pedazos de `chunk_size`
    ///
    /// Nunca envía más de lo declarado en `Content-Length`. Si el archivo
    /// se achicó mientras se enviaba, es un error: la respuesta queda
    /// truncada y la conexión se cierra.
    fn stream_body<W: Write>(&self, resource: Resource, out: &mut W) -> Result<u64, ServeError> {
        let Resource { file, len } = resource;

        let chunk_len = usize::try_from(len)
            .unwrap_or(usize::MAX)
            .clamp(1, self.chunk_size);
        let mut chunk = vec![0u8; chunk_len];
        let mut reader = file.take(len);
        let mut sent = 0u64;

        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            out.write_all(&chunk[..n])?;
            sent += n as u64;
        }

        if sent != len {
            return Err(ServeError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while serving: sent {} of {} bytes", sent, len),
            )));
        }

        Ok(sent)
    }
}
