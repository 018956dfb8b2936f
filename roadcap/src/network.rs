use crate::constants::MAX_FRAME_BYTES;
use crate::error::{Error, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// u32 little-endian length prefix followed by the bincode body.
///
/// # Errors
/// `FrameTooLarge` when the body exceeds `MAX_FRAME_BYTES`.
pub fn frame_message<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let body = bincode::serialize(message)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(Error::FrameTooLarge {
            size: body.len(),
            limit: MAX_FRAME_BYTES,
        });
    }
    let size = u32::try_from(body.len()).map_err(|_| Error::FrameTooLarge {
        size: body.len(),
        limit: MAX_FRAME_BYTES,
    })?;

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&size.to_le_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// # Errors
/// Serialization, size or socket errors.
pub async fn send_message<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let framed = frame_message(message)?;
    debug!("Sending message of {} bytes", framed.len() - 4);

    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// # Errors
/// Socket errors (including EOF), oversized frames and undecodable bodies.
pub async fn receive_message<T, R>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut size_buf = [0u8; 4];
    reader.read_exact(&mut size_buf).await?;
    let size = u32::from_le_bytes(size_buf) as usize;
    if size > MAX_FRAME_BYTES {
        return Err(Error::FrameTooLarge {
            size,
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut buffer = vec![0u8; size];
    reader.read_exact(&mut buffer).await?;
    debug!("Received message of {} bytes", size);

    Ok(bincode::deserialize(&buffer)?)
}
