use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `trigger-desk`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; command plumbing continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum DeskError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Push channel ─────────────────────────────────────────────────────
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    // ── Trigger form ─────────────────────────────────────────────────────
    #[error("form: {0}")]
    Form(#[from] FormError),

    // ── REST API ─────────────────────────────────────────────────────────
    #[error("api: {0}")]
    Api(#[from] ApiError),

    // ── Database reset ───────────────────────────────────────────────────
    #[error("nuke: {0}")]
    Nuke(#[from] NukeError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Push channel errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("server refused namespace connect: {0}")]
    ConnectRefused(String),

    #[error("malformed packet: {0}")]
    Packet(String),

    #[error("channel closed")]
    Closed,
}

// ─── Form errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("select exactly one trigger (tag or message) and a message to trigger")]
    Invalid,

    #[error("form is not mounted")]
    NotMounted,

    #[error("unknown tag {0}")]
    UnknownTag(String),

    #[error("message {0} does not accept an unstructured reply")]
    NotTriggerSource(String),

    #[error("unknown message {0}")]
    UnknownMessage(String),

    #[error("message {id} has undecodable data: {message}")]
    Decode { id: String, message: String },
}

// ─── REST API errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("server rejected trigger ({status}): {body}")]
    Rejected { status: u16, body: String },
}

// ─── Database reset errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NukeError {
    #[error("dropping trigger functions failed: {0}")]
    DropFunctions(String),

    #[error("listing tables failed: {0}")]
    ListTables(String),

    #[error("dropping table {table} failed: {message}")]
    DropTable { table: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, DeskError>;
