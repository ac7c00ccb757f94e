//! Banner grabbing on freshly opened TCP connections.
//!
//! Reads whatever the service sends first. Services on common HTTP ports
//! that stay silent get a minimal request to provoke a status line.

use crate::services::is_http_port;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
pub const MAX_BANNER_SIZE: usize = 1024;

/// Banners longer than this many characters are cut and marked with `...`.
pub const MAX_BANNER_CHARS: usize = 50;

/// Default deadline for the banner read, independent of the connect timeout.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(2);

const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Grab a banner from an established connection.
///
/// Returns `None` on read errors, timeouts and empty or whitespace-only
/// replies. Never fails the surrounding probe.
pub async fn grab_banner<S>(stream: &mut S, port: u16, read_timeout: Duration) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];

    match timeout(read_timeout, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => return format_banner(&buffer[..n]),
        // Peer closed or the read failed: nothing more to learn.
        Ok(_) => return None,
        Err(_) => {}
    }

    if !is_http_port(port) {
        return None;
    }

    stream.write_all(HTTP_PROBE).await.ok()?;
    match timeout(read_timeout, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => format_banner(&buffer[..n]),
        _ => None,
    }
}

/// Clean raw banner bytes for display.
///
/// Control bytes become spaces or dots, whitespace runs collapse, the result
/// is trimmed and cut to [`MAX_BANNER_CHARS`].
pub fn format_banner(data: &[u8]) -> Option<String> {
    let mut cleaned = String::with_capacity(data.len());
    let mut prev_space = false;

    for &b in data {
        let c = if b.is_ascii_graphic() {
            b as char
        } else if b.is_ascii_whitespace() {
            ' '
        } else {
            '.'
        };

        if c == ' ' {
            if !prev_space {
                cleaned.push(c);
            }
            prev_space = true;
        } else {
            cleaned.push(c);
            prev_space = false;
        }
    }

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(truncate_banner(trimmed))
}

fn truncate_banner(s: &str) -> String {
    if s.chars().count() <= MAX_BANNER_CHARS {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(MAX_BANNER_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
