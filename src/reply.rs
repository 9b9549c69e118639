use core::fmt::{self, Display, Formatter};

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// SMTP reply codes the sink emits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Debug)]
pub enum Code {
    ServiceReady = 220,
    Closing = 221,
    Ok = 250,
    StartMailInput = 354,
    ServiceUnavailable = 421,
    LocalError = 451,
    TooManyRecipients = 452,
    SyntaxError = 500,
    ParameterSyntaxError = 501,
    NotImplemented = 502,
    BadSequence = 503,
    ActionNotTaken = 550,
    MessageTooLarge = 552,
}

impl Display for Code {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(fmt, "{}", *self as u16)
    }
}

/// One complete reply: a code and one or more text lines.
///
/// Rendering follows RFC 5321 framing: every line but the last uses the
/// continuation form `code-text`, the last uses `code text`, each terminated
/// by CRLF. Writing a reply always ends with a flush so the client sees it
/// before the next command is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: Code,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: Code, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    pub fn with_lines(code: Code, lines: Vec<String>) -> Self {
        debug_assert!(!lines.is_empty());
        Self { code, lines }
    }

    pub fn ok() -> Self {
        Self::new(Code::Ok, "OK")
    }

    pub fn bad_sequence() -> Self {
        Self::new(Code::BadSequence, "Bad sequence of commands")
    }

    pub fn invalid_syntax() -> Self {
        Self::new(Code::ParameterSyntaxError, "Syntax error in parameters or arguments")
    }

    pub fn code(&self) -> Code {
        self.code
    }

    /// Render the reply to wire form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            let sep = if idx + 1 == self.lines.len() { ' ' } else { '-' };
            out.push_str(&format!("{}{}{}\r\n", self.code, sep, line));
        }
        out
    }

    /// Write the reply and flush it.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(self.render().as_bytes()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_displays_as_number() {
        assert_eq!(Code::Ok.to_string(), "250");
        assert_eq!(Code::StartMailInput.to_string(), "354");
        assert_eq!(Code::BadSequence.to_string(), "503");
    }

    #[test]
    fn single_line_uses_final_form() {
        assert_eq!(Reply::ok().render(), "250 OK\r\n");
    }

    #[test]
    fn multiline_uses_continuation_form_except_last() {
        let reply = Reply::with_lines(
            Code::Ok,
            vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string(),
            ],
        );
        assert_eq!(reply.render(), "250-first\r\n250-second\r\n250 third\r\n");
    }

    #[tokio::test]
    async fn write_to_emits_wire_form() {
        let mut buffer = Vec::new();
        let reply = Reply::new(Code::Closing, "Service closing transmission channel");
        reply.write_to(&mut buffer).await.unwrap();
        assert_eq!(buffer, b"221 Service closing transmission channel\r\n");
    }
}
