use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

use smtp_sink::{Config, Sink};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "smtp-sink",
    about = "A SMTP sink server that accepts mail, logs it and discards it"
)]
pub struct Opt {
    /// Address to listen on (host:port)
    pub address: String,

    /// Server name presented in the banner and greeting
    #[structopt(long = "server-name", default_value = "mx.example.com")]
    pub server_name: String,

    /// Append diagnostics to this file as well as stdout
    #[structopt(long = "logs", parse(from_os_str))]
    pub log_file: Option<PathBuf>,

    /// Log the full command/reply dialogue
    #[structopt(short = "v", long = "verbose")]
    pub verbose: bool,

    /// Seconds to wait for each command line (0 disables the deadline)
    #[structopt(long = "read-timeout", default_value = "300")]
    pub read_timeout: u64,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    let config = Config {
        address: opt.address,
        server_name: opt.server_name,
        log_file: opt.log_file,
        verbose: opt.verbose,
        read_timeout: Duration::from_secs(opt.read_timeout),
    };

    let sink = match Sink::new(config) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            eprintln!("[ERROR] Failed to start: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = sink.run().await {
        eprintln!("[ERROR] Server error: {e:#}");
        std::process::exit(1);
    }
}
