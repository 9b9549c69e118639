//! An SMTP sink: a server that speaks enough of the mail-transfer dialogue
//! for any client to hand it a message, then logs the envelope and throws
//! it away. Useful as a test double for systems that send mail.
//!
//! Supported verbs: `EHLO`/`HELO`, `MAIL FROM:`, `RCPT TO:`, `DATA`,
//! `RSET`, `NOOP`, `QUIT`, and `VRFY` (always 502). Anything else gets a
//! 500. Nothing is relayed or delivered; there is no AUTH and no TLS.
//!
//! The protocol engine ([`Session`]) is synchronous and I/O-free so it can
//! be driven directly in tests; [`Sink`] wires it to TCP, one task per
//! connection. Message bodies are dot-unstuffed and capped at
//! [`data::MAX_BODY_BYTES`].

pub mod command;
pub mod data;
pub mod logger;
pub mod reply;
pub mod session;
pub mod sink;

pub use command::Command;
pub use reply::{Code, Reply};
pub use session::{Action, Envelope, Session, State};
pub use sink::{Config, Sink};
