//! # Códigos de Estado HTTP
//!
//! Códigos de estado HTTP/1.0 que el servidor de archivos puede responder.
//! Según el RFC 1945:
//!
//! - **2xx**: Éxito (200 OK, archivo servido)
//! - **4xx**: Error del cliente (400, 403, 404)
//! - **5xx**: Error del servidor (500)

/// Códigos de estado que soporta el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - El archivo se envía en el body
    Ok = 200,

    /// 400 Bad Request - Request line malformada o header demasiado grande
    BadRequest = 400,

    /// 403 Forbidden - El path intenta salir del directorio servido
    Forbidden = 403,

    /// 404 Not Found - El archivo no existe
    NotFound = 404,

    /// 500 Internal Server Error - Método no soportado, directorio o error de IO
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) del RFC 1945
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
        assert_eq!(StatusCode::Forbidden.as_u16(), 403);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::Forbidden.to_string(), "403 Forbidden");
        assert_eq!(StatusCode::InternalServerError.to_string(), "500 Internal Server Error");
    }
}
