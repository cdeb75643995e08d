// Every variant states *where* things went wrong. None of them is fatal to the
// process: the session survives and the user can retry or discard the edit.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Image decode error: {0}")]
    ImageDecode(String), // Upload unreadable, unsupported or too large

    #[error("Export error: {0}")]
    Export(String), // Compositing the result failed; working mask is kept

    #[error("Encode error: {0}")]
    Encode(String), // Writing the exported image failed

    #[error("Config error: {0}")]
    Config(String), // Configuration file unreadable or invalid

    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
