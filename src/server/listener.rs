//! # Socket de Escucha
//! src/server/listener.rs
//!
//! `TcpListener::bind` de std no permite elegir el backlog, así que el
//! socket se arma a mano: socket → SO_REUSEADDR → bind → listen. El fd
//! queda en un `OwnedFd` desde el primer momento, de modo que cualquier
//! error a mitad de camino lo cierra.

use std::io;
use std::mem;
use std::net::{SocketAddrV4, TcpListener};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// Crea un listener IPv4 con reuse de dirección y el backlog pedido
pub fn bind_listener(addr: SocketAddrV4, backlog: u32) -> io::Result<TcpListener> {
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `fd` es un descriptor recién creado y nadie más lo posee
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let opt: libc::c_int = 1;
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &opt as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_port = addr.port().to_be();
    sin.sin_addr = libc::in_addr {
        s_addr: u32::from(*addr.ip()).to_be(),
    };

    let ret = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &sin as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    let backlog = backlog.min(libc::c_int::MAX as u32) as libc::c_int;
    if unsafe { libc::listen(socket.as_raw_fd(), backlog) } != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(TcpListener::from(socket))
}
