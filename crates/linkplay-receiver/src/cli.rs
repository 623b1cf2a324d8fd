use clap::Parser;
use linkplay_core::{ReceiverConfig, STREAM_PORT};

#[derive(Parser, Debug)]
#[command(
    name = "linkplay-receiver",
    about = "Play a LinkPlay stream with ffplay (low-latency MPEG-TS over UDP)",
    version
)]
pub struct Cli {
    /// UDP port to listen on
    #[arg(long, default_value_t = STREAM_PORT)]
    pub port: u16,

    /// ffplay window title (OBS window capture matches on it)
    #[arg(long, value_name = "TITLE")]
    pub window_title: Option<String>,
}

impl Cli {
    pub fn receiver_config(&self) -> ReceiverConfig {
        let defaults = ReceiverConfig::default();
        ReceiverConfig {
            port:         self.port,
            window_title: self.window_title.clone().unwrap_or(defaults.window_title),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_stream_port() {
        let cfg = Cli::try_parse_from(["linkplay-receiver"]).unwrap().receiver_config();
        assert_eq!(cfg, ReceiverConfig::default());
        assert_eq!(cfg.port, 5555);
    }

    #[test]
    fn overrides_port_and_title() {
        let cli = Cli::try_parse_from(["linkplay-receiver", "--port", "6000", "--window-title", "Desk"]).unwrap();
        let cfg = cli.receiver_config();
        assert_eq!(cfg.port, 6000);
        assert_eq!(cfg.window_title, "Desk");
        assert_eq!(cfg.player, "ffplay");
    }
}
