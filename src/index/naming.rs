use crate::error::{IndexError, Result};

const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "CLOCK$", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
    "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Check an index or package name against the portable naming rules.
///
/// # Errors
///
/// Returns [`IndexError::InvalidName`] if the name is empty, contains a path
/// separator or control character, consists only of dots, starts or ends
/// with a dot or whitespace, or is a reserved device name.
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid(name) {
        Ok(())
    } else {
        Err(IndexError::InvalidName(name.to_string()))
    }
}

fn is_valid(name: &str) -> bool {
    if name.is_empty() || name.trim() != name {
        return false;
    }
    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return false;
    }
    if name.starts_with('.') || name.ends_with('.') {
        return false;
    }

    let base = name.split('.').next().unwrap_or(name);
    !RESERVED.iter().any(|r| r.eq_ignore_ascii_case(base))
}
