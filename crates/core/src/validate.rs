//! Client-side checks run before any request is sent.

/// A required form field was empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
}

/// Trimmed value of a required field.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed)
}

pub const AGENT_TOKEN_PREFIX: &str = "token_";

const TOKEN_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Token for an agent created without one: `token_` + 9 random lowercase
/// alphanumerics.
pub fn generate_agent_token() -> String {
    let bits = uuid::Uuid::new_v4().as_u128();
    format!("{AGENT_TOKEN_PREFIX}{}", base36_suffix(bits))
}

// Lowest base-36 digits of `bits`, most significant first.
fn base36_suffix(mut bits: u128) -> String {
    let mut digits = [b'0'; TOKEN_SUFFIX_LEN];
    for slot in digits.iter_mut().rev() {
        *slot = BASE36[(bits % 36) as usize];
        bits /= 36;
    }
    digits.iter().map(|&b| char::from(b)).collect()
}

/// The token the user typed, or a generated one when left blank.
pub fn agent_token_or_generate(input: &str) -> String {
    match input.trim() {
        "" => generate_agent_token(),
        token => token.to_string(),
    }
}
