//! src/rpc/codec.rs
//!
//! Length-prefixed framing for a single request or response on a TCP stream:
//! a 4-byte little-endian length, then that many bytes of `bincode`-encoded
//! payload.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The maximum allowed size for a single RPC frame. Generous for this
/// protocol's tiny messages; mainly a guard against a peer sending garbage.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

pub async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    w.write_u32_le(bytes.len() as u32).await?;
    w.write_all(bytes).await?;
    w.flush().await?;
    Ok(())
}

pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> std::io::Result<Vec<u8>> {
    let len = r.read_u32_le().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("RPC frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"),
        ));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    Ok(buf)
}
