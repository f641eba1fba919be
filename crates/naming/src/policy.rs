use crate::error::{ErrorKind, Result};
use crate::models::Identifier;

/// Verify that both rendered names still carry the braced identifier.
///
/// Runs after shortening and before anything touches the filesystem.
pub fn enforce_identifier(folder: &str, file: &str, identifier: &Identifier) -> Result<()> {
    let token = identifier.token();
    let in_folder = folder.contains(&token);
    let in_file = file.contains(&token);
    if in_folder && in_file {
        return Ok(());
    }
    tracing::error!(identifier = %token, folder, file, in_folder, in_file, "Identifier missing from rendered name");
    exn::bail!(ErrorKind::IdentifierPolicyViolation {
        identifier: token,
        in_folder,
        in_file,
    })
}
