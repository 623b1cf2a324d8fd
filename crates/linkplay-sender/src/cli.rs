use clap::Parser;
use linkplay_core::{ConfigError, SenderConfig};

#[derive(Parser, Debug)]
#[command(
    name = "linkplay-sender",
    about = "Stream this desktop to a LinkPlay receiver (FFmpeg + NVENC, MPEG-TS over UDP)",
    version
)]
pub struct Cli {
    /// Receiver IP address or hostname [default: 192.168.1.100]
    #[arg(value_name = "HOST")]
    pub host: Option<String>,
}

impl Cli {
    /// Default config with the command-line host applied.
    pub fn sender_config(&self) -> Result<SenderConfig, ConfigError> {
        match &self.host {
            Some(host) => SenderConfig::default().with_host(host),
            None => Ok(SenderConfig::default()),
        }
    }
}
