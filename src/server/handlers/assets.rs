use std::io;

use crate::error::{unexpected_error, Error};

pub const MAIN_PAGE: &str = "main_page.html";
pub const ADMIN_PAGE: &str = "admin.html";

/// Missing files are answered with 404 by the file services themselves; this
/// only sees genuine I/O failures.
pub async fn io_error(err: io::Error) -> Error {
    tracing::error!(error = %err, "failed to serve static file");

    unexpected_error()
}
