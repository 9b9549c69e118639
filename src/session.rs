use crate::command::{self, Command};
use crate::reply::{Code, Reply};

/// Most recipients one envelope will accept; the next RCPT gets a 452.
pub const MAX_RECIPIENTS: usize = 100;

/// Dialogue phase of one SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Connected, no EHLO/HELO yet.
    AwaitingGreeting,
    /// Greeted, ready for MAIL.
    AwaitingSender,
    /// Sender declared, ready for the first RCPT.
    AwaitingRecipient,
    /// At least one recipient declared, ready for DATA or more RCPTs.
    AwaitingData,
    /// Body transfer in progress.
    ReadingData,
    /// Body captured.
    Completed,
}

/// One mail attempt: reverse-path, forward-paths and the raw body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    sender: String,
    recipients: Vec<String>,
    body: Vec<u8>,
}

impl Envelope {
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// What the dialogue loop should do with the reply a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write the reply and read the next command.
    Reply(Reply),
    /// Write the 354 invitation, then collect the message body.
    CollectBody(Reply),
    /// Write the reply and end the dialogue.
    Close(Reply),
}

impl Action {
    pub fn reply(&self) -> &Reply {
        match self {
            Self::Reply(reply) | Self::CollectBody(reply) | Self::Close(reply) => reply,
        }
    }
}

/// Per-connection protocol state: the client identifier from the greeting,
/// the dialogue phase, and the envelope under construction.
///
/// The envelope exists exactly while the phase is past `AwaitingSender`; a
/// command rejected for ordering or syntax changes neither. All I/O happens
/// in the dialogue loop; `handle` only computes the transition and the
/// reply.
#[derive(Debug)]
pub struct Session {
    server_name: String,
    client: String,
    state: State,
    envelope: Option<Envelope>,
}

impl Session {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            client: String::new(),
            state: State::AwaitingGreeting,
            envelope: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Dispatch one parsed command. Verbs are matched on their upper-cased
    /// form; an empty or unknown verb falls through to the 500 arm.
    pub fn handle(&mut self, command: &Command) -> Action {
        match command.verb.as_str() {
            "EHLO" | "HELO" => self.greet(&command.args),
            "MAIL" => self.declare_sender(&command.args),
            "RCPT" => self.declare_recipient(&command.args),
            "DATA" => self.start_data(),
            "RSET" => self.reset(),
            "NOOP" => Action::Reply(Reply::ok()),
            "QUIT" => Action::Close(Reply::new(
                Code::Closing,
                "Service closing transmission channel",
            )),
            "VRFY" => Action::Reply(Reply::new(Code::NotImplemented, "Command not implemented")),
            _ => Action::Reply(Reply::new(Code::SyntaxError, "Syntax error")),
        }
    }

    /// EHLO/HELO: legal anywhere, replaces the whole session.
    fn greet(&mut self, args: &str) -> Action {
        self.client = if args.is_empty() { "unknown" } else { args }.to_string();
        self.state = State::AwaitingSender;
        self.envelope = None;

        Action::Reply(Reply::new(
            Code::Ok,
            format!("{} greets {}", self.server_name, self.client),
        ))
    }

    /// MAIL FROM:<reverse-path>. The argument is validated before the
    /// envelope is created, so a rejected command leaves no trace.
    fn declare_sender(&mut self, args: &str) -> Action {
        if self.state != State::AwaitingSender {
            return Action::Reply(Reply::bad_sequence());
        }

        let Some(sender) = command::path_argument(args, "FROM:") else {
            return Action::Reply(Reply::invalid_syntax());
        };

        self.envelope = Some(Envelope {
            sender,
            ..Envelope::default()
        });
        self.state = State::AwaitingRecipient;

        Action::Reply(Reply::ok())
    }

    /// RCPT TO:<forward-path>. Accepted after MAIL and after earlier RCPTs,
    /// so one envelope can carry several recipients.
    fn declare_recipient(&mut self, args: &str) -> Action {
        if !matches!(self.state, State::AwaitingRecipient | State::AwaitingData) {
            return Action::Reply(Reply::bad_sequence());
        }

        let Some(recipient) = command::path_argument(args, "TO:") else {
            return Action::Reply(Reply::invalid_syntax());
        };

        let Some(envelope) = self.envelope.as_mut() else {
            return Action::Reply(Reply::bad_sequence());
        };

        if envelope.recipients.len() >= MAX_RECIPIENTS {
            return Action::Reply(Reply::new(Code::TooManyRecipients, "Too many recipients"));
        }

        envelope.recipients.push(recipient);
        self.state = State::AwaitingData;

        Action::Reply(Reply::ok())
    }

    fn start_data(&mut self) -> Action {
        if self.state != State::AwaitingData {
            return Action::Reply(Reply::bad_sequence());
        }

        self.state = State::ReadingData;

        Action::CollectBody(Reply::new(
            Code::StartMailInput,
            "Start mail input; end with <CRLF>.<CRLF>",
        ))
    }

    /// Attach the captured body once the data-block reader succeeds.
    pub fn finish_data(&mut self, body: Vec<u8>) {
        if let Some(envelope) = self.envelope.as_mut() {
            envelope.body = body;
        }
        self.state = State::Completed;
    }

    /// RSET: drop the envelope, return to the post-greeting phase.
    fn reset(&mut self) -> Action {
        self.envelope = None;
        self.state = State::AwaitingSender;

        Action::Reply(Reply::ok())
    }
}
