use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::AccountStoreError;

pub const DEFAULT_ACCOUNTS_FILE: &str = "accounts.txt";

pub const ACCOUNTS_TEMPLATE: &str = "\
# wbsim account file
# Format: invoker_id,session_id
# One account per line, comma separated.
# Lines starting with # are comments.

# Example 1
186812,488eb840-c068-4c75-9df3-a3XXXXX

# Example 2
# 123456,abcdef12-3456-7890-abcd-efghijklmnop
";

/// Write the commented account template to `path`.
pub fn write_template(path: &Path, overwrite: bool) -> Result<(), AccountStoreError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            AccountStoreError::AlreadyExists {
                path: path.to_path_buf(),
            }
        } else {
            AccountStoreError::io("creating template", path, source)
        }
    })?;

    file.write_all(ACCOUNTS_TEMPLATE.as_bytes())
        .map_err(|source| AccountStoreError::io("writing template", path, source))
}
