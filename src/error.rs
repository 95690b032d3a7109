//! Error types for VayuLink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// VayuLink error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be written
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Port has not been opened
    #[error("Port not open")]
    NotOpen,

    /// No peer is attached to the port
    #[error("Not connected")]
    NotConnected,

    /// No data was ready within the allowed time
    #[error("Communication timeout")]
    Timeout,

    /// Invalid packet or frame
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Driver name not present in the registry
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    /// Transport name not recognized
    #[error("Unknown transport: {0}")]
    UnknownTransport(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
