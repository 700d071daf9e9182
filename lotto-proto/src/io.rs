//! Full-read and full-write loops over async byte streams.
//!
//! A single `read`/`write` call may transfer fewer bytes than requested.
//! These helpers loop until the whole buffer is transferred and report a
//! peer close as [`Error::ConnectionClosed`] rather than a generic I/O
//! error.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Writes every byte of `buf`, retrying on short writes.
pub async fn write_all<W>(w: &mut W, mut buf: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    while !buf.is_empty() {
        match w.write(buf).await {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Fills `buf` completely, retrying on short reads.
///
/// Fails with [`Error::ConnectionClosed`] if the peer closes first.
pub async fn read_exact_into<R>(r: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]).await {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Reads exactly `n` bytes.
pub async fn read_exact<R>(r: &mut R, n: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; n];
    read_exact_into(r, &mut buf).await?;
    Ok(buf)
}
