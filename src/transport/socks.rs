//! SOCKS5 CONNECT dialer (RFC 1928), no-authentication method only.

use std::net::{Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::SessionError;

const SOCKS_VERSION: u8 = 0x05;
const AUTH_NO_AUTH: u8 = 0x00;
const CMD_CONNECT: u8 = 0x01;
const ADDR_IPV4: u8 = 0x01;
const ADDR_DOMAIN: u8 = 0x03;
const ADDR_IPV6: u8 = 0x04;
const REPLY_SUCCESS: u8 = 0x00;

/// Open a TCP stream to `target` (host:port) tunneled through the proxy at `proxy`.
pub async fn connect(proxy: &str, target: &str) -> Result<TcpStream, SessionError> {
    let (host, port) = split_host_port(target)?;

    let mut stream = TcpStream::connect(proxy)
        .await
        .map_err(|source| SessionError::Connect {
            target: proxy.to_string(),
            source,
        })?;

    negotiate(&mut stream, host, port).await?;
    debug!(proxy, target, "SOCKS5 tunnel established");
    Ok(stream)
}

async fn negotiate(stream: &mut TcpStream, host: &str, port: u16) -> Result<(), SessionError> {
    // Greeting: offer the no-auth method only
    stream
        .write_all(&[SOCKS_VERSION, 1, AUTH_NO_AUTH])
        .await
        .map_err(io_error)?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await.map_err(io_error)?;
    if choice[0] != SOCKS_VERSION {
        return Err(SessionError::Proxy(format!(
            "unsupported SOCKS version: {}",
            choice[0]
        )));
    }
    if choice[1] != AUTH_NO_AUTH {
        return Err(SessionError::Proxy(
            "proxy requires an authentication method we do not support".into(),
        ));
    }

    let mut request = vec![SOCKS_VERSION, CMD_CONNECT, 0x00];
    encode_address(&mut request, host)?;
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await.map_err(io_error)?;

    // Reply: VER REP RSV ATYP BND.ADDR BND.PORT
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.map_err(io_error)?;
    if header[0] != SOCKS_VERSION {
        return Err(SessionError::Proxy(
            "invalid SOCKS version in reply".into(),
        ));
    }
    if header[1] != REPLY_SUCCESS {
        return Err(SessionError::Proxy(reply_message(header[1]).into()));
    }

    let bound_len = match header[3] {
        ADDR_IPV4 => 4,
        ADDR_IPV6 => 16,
        ADDR_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await.map_err(io_error)?;
            len[0] as usize
        }
        other => {
            return Err(SessionError::Proxy(format!(
                "unsupported address type in reply: {other}"
            )));
        }
    };
    let mut bound = vec![0u8; bound_len + 2];
    stream.read_exact(&mut bound).await.map_err(io_error)?;

    Ok(())
}

fn encode_address(request: &mut Vec<u8>, host: &str) -> Result<(), SessionError> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        request.push(ADDR_IPV4);
        request.extend_from_slice(&ip.octets());
    } else if let Ok(ip) = host.parse::<Ipv6Addr>() {
        request.push(ADDR_IPV6);
        request.extend_from_slice(&ip.octets());
    } else {
        let len = u8::try_from(host.len())
            .map_err(|_| SessionError::Proxy(format!("host name too long: {host}")))?;
        request.push(ADDR_DOMAIN);
        request.push(len);
        request.extend_from_slice(host.as_bytes());
    }
    Ok(())
}

/// Split "host:port", accepting bracketed IPv6 hosts.
fn split_host_port(target: &str) -> Result<(&str, u16), SessionError> {
    let invalid = || SessionError::Proxy(format!("invalid target address: {target}"));
    let (host, port) = target.rsplit_once(':').ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host, port))
}

fn reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown SOCKS reply code",
    }
}

fn io_error(e: std::io::Error) -> SessionError {
    SessionError::Proxy(e.to_string())
}
