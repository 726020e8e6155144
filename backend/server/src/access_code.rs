//! # Access Codes
//!
//! Short codes handed to registrants at the door.
//!
//! - Generated here, never accepted from the client
//! - 8 characters from an alphabet without look-alikes (`0/O`, `1/I/L`)
//! - Rendered as two groups of four, `XXXX-XXXX`
//! - 31^8 possible codes, collisions are possible but not checked
use std::fmt::{self, Display};

use rand::Rng;
use serde::{Deserialize, Serialize};

const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const GROUP_LEN: usize = 4;
const GROUPS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for AccessCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn generate_access_code() -> AccessCode {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(GROUPS * GROUP_LEN + GROUPS - 1);

    for group in 0..GROUPS {
        if group > 0 {
            code.push('-');
        }

        for _ in 0..GROUP_LEN {
            let index = rng.random_range(0..ALPHABET.len());
            code.push(ALPHABET[index] as char);
        }
    }

    AccessCode(code)
}
