use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid target host {host:?}: {reason}")]
    InvalidHost { host: String, reason: &'static str },

    #[error("frame rate must be positive")]
    InvalidFrameRate,
}

#[derive(Error, Debug)]
pub enum LaunchError {
    /// The OS refused to create the child process.
    #[error("failed to start {program} (error code {}): {source}", code_label(.code))]
    Spawn {
        program: String,
        code:    Option<i32>,
        #[source]
        source:  std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source:  std::io::Error,
    },
}

impl LaunchError {
    pub(crate) fn spawn(program: &str, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_owned(),
            code:    source.raw_os_error(),
            source,
        }
    }

    /// Platform error code reported by the OS, when there is one.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { code, .. } => *code,
            Self::Wait { source, .. } => source.raw_os_error(),
        }
    }

    /// True when the executable could not be found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Spawn { source, .. } | Self::Wait { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
        }
    }
}

fn code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_owned(), |c| c.to_string())
}
