use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Receiver address used when the operator does not name one.
pub const DEFAULT_TARGET_HOST: &str = "192.168.1.100";
/// UDP port the MPEG-TS stream is sent to (and the receiver listens on).
pub const STREAM_PORT: u16 = 5555;
pub const DEFAULT_FRAME_RATE: u32 = 60;
/// NVIDIA NVENC H.264 encoder as named by FFmpeg.
pub const DEFAULT_ENCODER: &str = "h264_nvenc";

// ── TargetHost ────────────────────────────────────────────────────────────────

/// Destination host, validated on construction.
///
/// Accepts an IPv4/IPv6 literal (IPv6 optionally bracketed) or a DNS hostname
/// made of `[A-Za-z0-9-]` labels. Anything else is rejected, so a host can
/// never smuggle extra arguments into the toolkit's command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetHost(String);

impl TargetHost {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidHost { host: raw.to_owned(), reason };

        if raw.is_empty() {
            return Err(invalid("host is empty"));
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return inner
                .parse::<Ipv6Addr>()
                .map(|ip| Self(ip.to_string()))
                .map_err(|_| invalid("bracketed host is not an IPv6 address"));
        }
        if let Ok(ip) = raw.parse::<IpAddr>() {
            return Ok(Self(ip.to_string()));
        }

        if raw.len() > 253 {
            return Err(invalid("hostname longer than 253 characters"));
        }
        let name = raw.strip_suffix('.').unwrap_or(raw);
        for label in name.split('.') {
            if label.is_empty() || label.len() > 63 {
                return Err(invalid("hostname label must be 1-63 characters"));
            }
            if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                return Err(invalid("hostname may only contain letters, digits, '-' and '.'"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(invalid("hostname label may not start or end with '-'"));
            }
        }
        // "10.0.0.256" passes the label rules but is a typo'd address, not a name.
        if name.rsplit('.').next().is_some_and(|tld| tld.bytes().all(|b| b.is_ascii_digit())) {
            return Err(invalid("not a valid IP address"));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host as it appears in a URI authority (`[..]` around IPv6 literals).
    pub fn uri_authority(&self) -> String {
        if self.0.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]", self.0)
        } else {
            self.0.clone()
        }
    }
}

impl Default for TargetHost {
    fn default() -> Self {
        Self(DEFAULT_TARGET_HOST.to_owned())
    }
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TargetHost {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TargetHost> for String {
    fn from(host: TargetHost) -> Self {
        host.0
    }
}

// ── StreamTarget ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamTarget {
    pub host: TargetHost,
    pub port: u16,
}

impl Default for StreamTarget {
    fn default() -> Self {
        Self { host: TargetHost::default(), port: STREAM_PORT }
    }
}

impl StreamTarget {
    /// `udp://<host>:<port>` output URI handed to FFmpeg.
    pub fn udp_uri(&self) -> String {
        format!("udp://{}:{}", self.host.uri_authority(), self.port)
    }
}

// ── Encoder / capture ─────────────────────────────────────────────────────────

/// Hardware encoder and its low-latency knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// FFmpeg encoder name, also the substring the capability probe looks for.
    pub name:         String,
    /// `p1` is the fastest NVENC preset.
    pub preset:       String,
    /// `ll` = low latency.
    pub tune:         String,
    /// Constant QP; 0 is lossless.
    pub qp:           u32,
    pub rate_control: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            name:         DEFAULT_ENCODER.to_owned(),
            preset:       "p1".to_owned(),
            tune:         "ll".to_owned(),
            qp:           0,
            rate_control: "constqp".to_owned(),
        }
    }
}

/// Desktop grabber FFmpeg reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureInput {
    /// Windows GDI grabber, whole desktop.
    GdiGrab,
    /// X11 grabber, e.g. `:0.0`.
    X11Grab { display: String },
    /// macOS AVFoundation, screen device index such as `1`.
    AvFoundation { device: String },
}

impl CaptureInput {
    /// Value for FFmpeg's input `-f`.
    pub fn format(&self) -> &'static str {
        match self {
            CaptureInput::GdiGrab              => "gdigrab",
            CaptureInput::X11Grab { .. }       => "x11grab",
            CaptureInput::AvFoundation { .. }  => "avfoundation",
        }
    }

    /// Value for FFmpeg's `-i`.
    pub fn input(&self) -> &str {
        match self {
            CaptureInput::GdiGrab                  => "desktop",
            CaptureInput::X11Grab { display }      => display,
            CaptureInput::AvFoundation { device }  => device,
        }
    }
}

impl Default for CaptureInput {
    #[cfg(target_os = "windows")]
    fn default() -> Self {
        CaptureInput::GdiGrab
    }

    #[cfg(target_os = "macos")]
    fn default() -> Self {
        CaptureInput::AvFoundation { device: "1".to_owned() }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn default() -> Self {
        CaptureInput::X11Grab { display: ":0.0".to_owned() }
    }
}

// ── WaitOptions ───────────────────────────────────────────────────────────────

/// How long to wait for a launched child, and how gently to stop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// `None` waits until the child exits on its own.
    pub timeout: Option<Duration>,
    /// Time between SIGTERM and the hard kill. Unix only; other platforms
    /// terminate the child immediately.
    pub grace:   Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self { timeout: None, grace: Duration::from_secs(1) }
    }
}

// ── SenderConfig ──────────────────────────────────────────────────────────────

/// Everything the sender needs for one streaming run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub target:     StreamTarget,
    #[serde(alias = "frameRate")]
    pub frame_rate: u32,
    pub encoder:    EncoderSettings,
    pub capture:    CaptureInput,
    /// FFmpeg executable name or path.
    pub toolkit:    String,
    pub wait:       WaitOptions,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            target:     StreamTarget::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            encoder:    EncoderSettings::default(),
            capture:    CaptureInput::default(),
            toolkit:    "ffmpeg".to_owned(),
            wait:       WaitOptions::default(),
        }
    }
}

impl SenderConfig {
    /// Replace the destination host, validating it.
    pub fn with_host(mut self, host: &str) -> Result<Self, ConfigError> {
        self.target.host = TargetHost::parse(host)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

// ── ReceiverConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// ffplay executable name or path.
    pub player:       String,
    pub port:         u16,
    /// Fixed title so OBS window capture can find the player.
    pub window_title: String,
    pub wait:         WaitOptions,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            player:       "ffplay".to_owned(),
            port:         STREAM_PORT,
            window_title: "LINKPLAY Stream (Capture This Window in OBS)".to_owned(),
            wait:         WaitOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ip_literals_and_hostnames() {
        assert_eq!(TargetHost::parse("10.0.0.5").unwrap().as_str(), "10.0.0.5");
        assert_eq!(TargetHost::parse("mac-mini.local").unwrap().as_str(), "mac-mini.local");
        assert_eq!(TargetHost::parse("receiver.lan.").unwrap().as_str(), "receiver.lan");
        assert_eq!(TargetHost::parse("[fe80::1]").unwrap().as_str(), "fe80::1");
    }

    #[test]
    fn rejects_command_metacharacters() {
        for bad in ["10.0.0.5 & calc", "host;rm -rf /", "a|b", "$(id)", "h\"q", "", "-f"] {
            assert!(TargetHost::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_malformed_hostnames() {
        assert!(TargetHost::parse("10.0.0.256").is_err());
        assert!(TargetHost::parse("a..b").is_err());
        assert!(TargetHost::parse(&"x".repeat(64)).is_err());
        assert!(TargetHost::parse("[not-v6]").is_err());
    }

    #[test]
    fn udp_uri_brackets_ipv6() {
        let v4 = StreamTarget { host: TargetHost::parse("10.0.0.5").unwrap(), port: 5555 };
        assert_eq!(v4.udp_uri(), "udp://10.0.0.5:5555");

        let v6 = StreamTarget { host: TargetHost::parse("::1").unwrap(), port: 6000 };
        assert_eq!(v6.udp_uri(), "udp://[::1]:6000");
    }

    #[test]
    fn defaults_match_stream_constants() {
        let cfg = SenderConfig::default();
        assert_eq!(cfg.target.host.as_str(), DEFAULT_TARGET_HOST);
        assert_eq!(cfg.target.port, 5555);
        assert_eq!(cfg.frame_rate, 60);
        assert_eq!(cfg.encoder.name, "h264_nvenc");
        assert_eq!(cfg.wait.timeout, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_frame_rate_is_invalid() {
        let cfg = SenderConfig { frame_rate: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidFrameRate));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let json = r#"{
            "target": {"host": "10.0.0.9"},
            "frameRate": 30,
            "capture": {"kind": "x11_grab", "display": ":1.0"}
        }"#;

        let cfg: SenderConfig = serde_json::from_str(json).expect("valid sender config");
        assert_eq!(cfg.target.host.as_str(), "10.0.0.9");
        assert_eq!(cfg.target.port, STREAM_PORT);
        assert_eq!(cfg.frame_rate, 30);
        assert_eq!(cfg.capture, CaptureInput::X11Grab { display: ":1.0".to_owned() });
        assert_eq!(cfg.encoder, EncoderSettings::default());
    }

    #[test]
    fn json_with_bad_host_is_rejected() {
        let json = r#"{"target": {"host": "x; shutdown"}}"#;
        assert!(serde_json::from_str::<SenderConfig>(json).is_err());
    }
}
