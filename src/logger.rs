use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;

/// Convert control characters to escape sequences so client-supplied text
/// cannot corrupt a terminal or the log file.
pub fn escape_control(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\0' => result.push_str("\\0"),
            '\x01'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\x7f' => {
                result.push_str(&format!("\\x{:02x}", c as u32));
            }
            _ if c.is_ascii_graphic() || c.is_ascii_whitespace() => {
                result.push(c);
            }
            _ => {
                result.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
        }
    }
    result
}

/// Diagnostic log sink: timestamped lines to stdout, mirrored to an
/// optional append-only file. Logging never affects the dialogue; write
/// failures are swallowed.
pub struct Logger {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    pub fn new(log_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let writer = if let Some(path) = log_file {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(Mutex::new(BufWriter::new(file)))
        } else {
            None
        };

        Ok(Self { writer })
    }

    /// Log one event attributed to a peer.
    pub fn log(&self, peer: &SocketAddr, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("{} {} {}\n", timestamp, peer, escape_control(message));

        print!("{}", line);

        if let Some(writer) = &self.writer {
            if let Ok(mut writer) = writer.lock() {
                let _ = writer.write_all(line.as_bytes());
                let _ = writer.flush();
            }
        }
    }

    /// Log a server-wide event with no peer attached.
    pub fn server(&self, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("{} {}\n", timestamp, message);

        print!("{}", line);

        if let Some(writer) = &self.writer {
            if let Ok(mut writer) = writer.lock() {
                let _ = writer.write_all(line.as_bytes());
                let _ = writer.flush();
            }
        }
    }

    /// Dump a captured message body between delimiter markers.
    pub fn dump_body(&self, peer: &SocketAddr, body: &[u8]) {
        let text = String::from_utf8_lossy(body);
        let dump = format!(
            "=== BODY BEGIN ===\n{}=== BODY END ===",
            escape_control(&text)
        );

        self.log(peer, &format!("captured {} byte body\n{}", body.len(), dump));
    }
}
