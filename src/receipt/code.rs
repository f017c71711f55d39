use std::fmt;

use rand::{distributions::Alphanumeric, Rng};

const CODE_LENGTH: usize = 8;

/// Token the customer types in to claim their purchase. Codes are not
/// stored anywhere, so nothing stops two receipts from sharing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionCode(String);

impl RedemptionCode {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = rng
            .sample_iter(&Alphanumeric)
            .take(CODE_LENGTH)
            .map(char::from)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RedemptionCode> for String {
    fn from(code: RedemptionCode) -> Self {
        code.0
    }
}
