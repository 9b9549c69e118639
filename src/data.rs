use thiserror::Error;
use tokio::io::AsyncBufReadExt;

/// Hard ceiling on bytes consumed while reading one message body.
pub const MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("message body exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("connection ended before the body terminator")]
    UnexpectedEof,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a DATA body up to the `.\r\n` terminator line.
///
/// Copies lines until a line that is exactly ".\r\n" at the start of a
/// line. A longer line starting with '.' has that first dot removed
/// (dot-stuffing). Only CRLF ends a line: a bare LF inside the stream is
/// body content, so "\n.\n" never terminates. `limit` bounds the total
/// bytes consumed from the stream; crossing it before the terminator is an
/// error and the collected bytes are dropped.
///
/// On success the returned bytes exclude the terminator line and have the
/// stuffing undone.
pub async fn read_body<R>(reader: &mut R, limit: usize) -> Result<Vec<u8>, BodyError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut body = Vec::new();
    let mut buffer = Vec::new();
    let mut consumed = 0usize;

    // True at the beginning of the body and after each CRLF. A read that
    // ends in a bare CR still ends the line if the next read is just LF.
    let mut start_of_line = true;
    let mut trailing_cr = false;

    loop {
        buffer.clear();
        reader.read_until(b'\n', &mut buffer).await?;

        if buffer.is_empty() {
            return Err(BodyError::UnexpectedEof);
        }

        consumed += buffer.len();
        if consumed > limit {
            return Err(BodyError::TooLarge { max: limit });
        }

        if start_of_line && buffer == b".\r\n" {
            break;
        }

        if start_of_line && buffer[0] == b'.' {
            body.extend_from_slice(&buffer[1..]);
        } else {
            body.extend_from_slice(&buffer);
        }

        start_of_line = buffer.ends_with(b"\r\n") || (buffer == b"\n" && trailing_cr);
        trailing_cr = buffer.ends_with(b"\r");
    }

    Ok(body)
}
