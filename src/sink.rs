use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader, ReadHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;

use crate::command::Command;
use crate::data::{self, BodyError, MAX_BODY_BYTES};
use crate::logger::Logger;
use crate::reply::{Code, Reply};
use crate::session::{Action, Session};

/// Process configuration, built once from the CLI and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    /// host:port to listen on.
    pub address: String,
    /// Identity presented in the banner and greeting replies.
    pub server_name: String,
    /// Mirror diagnostics to this file.
    pub log_file: Option<PathBuf>,
    /// Log every command and reply, not just lifecycle events.
    pub verbose: bool,
    /// Deadline for each command-line read; zero disables.
    pub read_timeout: Duration,
}

/// The sink server: accepts connections and runs one SMTP dialogue per
/// connection, each on its own task. Envelopes are logged and dropped.
pub struct Sink {
    config: Config,
    logger: Logger,
}

impl Sink {
    pub fn new(config: Config) -> Result<Self> {
        let logger = Logger::new(config.log_file.clone())?;
        Ok(Self { config, logger })
    }

    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(&self.config.address)
            .await
            .with_context(|| format!("failed to listen on {}", self.config.address))?;

        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener, so callers (and tests)
    /// can bind port 0 and learn the address first.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        self.logger
            .server(&format!("listening on {}", listener.local_addr()?));

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let this = Arc::clone(&self);

                    tokio::spawn(async move {
                        this.serve_connection(stream, peer).await;
                    });
                }
                Err(e) => {
                    self.logger.server(&format!("failed to accept: {e}"));
                }
            }
        }
    }

    /// One complete dialogue: banner, command loop, farewell.
    async fn serve_connection(&self, stream: TcpStream, peer: SocketAddr) {
        self.logger.log(&peer, "connection accepted");

        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let banner = Reply::new(
            Code::ServiceReady,
            format!("{} ESMTP", self.config.server_name),
        );
        self.write_reply(&mut writer, &peer, &banner).await;

        let mut session = Session::new(self.config.server_name.clone());
        let mut line = String::new();

        loop {
            line.clear();

            match self.read_command_line(&mut reader, &mut line).await {
                ReadOutcome::Line => {}
                ReadOutcome::TimedOut => {
                    self.logger.log(&peer, "no command within the read deadline");
                    let reply = Reply::new(
                        Code::ServiceUnavailable,
                        "Service closing transmission channel, timeout exceeded",
                    );
                    self.write_reply(&mut writer, &peer, &reply).await;
                    break;
                }
                ReadOutcome::Failed(reason) => {
                    self.logger.log(&peer, &format!("failed to read command: {reason}"));
                    let reply = Reply::new(Code::ActionNotTaken, "Requested action not taken");
                    self.write_reply(&mut writer, &peer, &reply).await;
                    break;
                }
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if self.config.verbose {
                self.logger.log(&peer, &format!(">> {trimmed}"));
            }

            let command = Command::parse(trimmed);
            let action = session.handle(&command);
            self.log_dispatch(&peer, &command, &session, &action);

            match action {
                Action::Reply(reply) => {
                    self.write_reply(&mut writer, &peer, &reply).await;
                }
                Action::CollectBody(invitation) => {
                    self.write_reply(&mut writer, &peer, &invitation).await;

                    match data::read_body(&mut reader, MAX_BODY_BYTES).await {
                        Ok(body) => {
                            self.logger.dump_body(&peer, &body);
                            session.finish_data(body);
                            self.write_reply(&mut writer, &peer, &Reply::ok()).await;
                        }
                        Err(err) => {
                            self.logger.log(&peer, &format!("failed to read body: {err}"));
                            let reply = match err {
                                BodyError::TooLarge { .. } => Reply::new(
                                    Code::MessageTooLarge,
                                    "Message size exceeds fixed maximum",
                                ),
                                BodyError::UnexpectedEof | BodyError::Io(_) => Reply::new(
                                    Code::LocalError,
                                    "Requested action aborted: error reading message body",
                                ),
                            };
                            self.write_reply(&mut writer, &peer, &reply).await;
                            break;
                        }
                    }
                }
                Action::Close(reply) => {
                    self.write_reply(&mut writer, &peer, &reply).await;
                    self.logger.log(&peer, "connection closed");
                    return;
                }
            }
        }

        // Every non-QUIT exit still gets the farewell, like the QUIT path.
        let farewell = Reply::new(Code::Closing, "Service closing transmission channel");
        self.write_reply(&mut writer, &peer, &farewell).await;
        self.logger.log(&peer, "connection closed");
    }

    async fn read_command_line(
        &self,
        reader: &mut BufReader<ReadHalf<TcpStream>>,
        line: &mut String,
    ) -> ReadOutcome {
        let read = if self.config.read_timeout.is_zero() {
            Ok(reader.read_line(line).await)
        } else {
            time::timeout(self.config.read_timeout, reader.read_line(line)).await
        };

        match read {
            Err(_) => ReadOutcome::TimedOut,
            Ok(Ok(0)) => ReadOutcome::Failed("connection closed by peer".to_string()),
            Ok(Ok(_)) => ReadOutcome::Line,
            Ok(Err(e)) => ReadOutcome::Failed(e.to_string()),
        }
    }

    /// Lifecycle events worth logging even without --verbose.
    fn log_dispatch(&self, peer: &SocketAddr, command: &Command, session: &Session, action: &Action) {
        let code = action.reply().code();

        match (command.verb.as_str(), code) {
            ("EHLO" | "HELO", Code::Ok) => {
                self.logger
                    .log(peer, &format!("greeted by {}", session.client()));
            }
            ("MAIL", Code::Ok) => {
                if let Some(envelope) = session.envelope() {
                    self.logger
                        .log(peer, &format!("received sender {}", envelope.sender()));
                }
            }
            ("RCPT", Code::Ok) => {
                if let Some(recipient) =
                    session.envelope().and_then(|e| e.recipients().last())
                {
                    self.logger
                        .log(peer, &format!("received recipient {recipient}"));
                }
            }
            (_, Code::SyntaxError) => {
                self.logger.log(
                    peer,
                    &format!(
                        "unrecognized command \"{}\" args \"{}\"",
                        command.verb, command.args
                    ),
                );
            }
            _ => {}
        }
    }

    async fn write_reply<W>(&self, writer: &mut W, peer: &SocketAddr, reply: &Reply)
    where
        W: AsyncWrite + Unpin,
    {
        if self.config.verbose {
            self.logger
                .log(peer, &format!("<< {}", reply.render().trim_end()));
        }

        if let Err(e) = reply.write_to(writer).await {
            self.logger.log(peer, &format!("failed to write reply: {e}"));
        }
    }
}

enum ReadOutcome {
    Line,
    TimedOut,
    Failed(String),
}
