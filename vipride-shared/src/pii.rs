use serde::{Serialize, Serializer};
use std::fmt;

/// Wraps customer contact data (e-mail, phone) so it can be handed to
/// `tracing` fields without leaking the full value.
///
/// `Debug` and `Display` keep only a short hint: the first character of the
/// local part plus the e-mail domain, or the last two digits of a phone
/// number. Serialization writes the real value, since API responses need it.
#[derive(Clone, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    fn hint(&self) -> String {
        let raw = self.0.to_string();
        let raw = raw.trim();
        if raw.is_empty() {
            return String::from("<empty>");
        }

        if let Some((local, domain)) = raw.split_once('@') {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            return format!("{}***@{}", first, domain);
        }

        let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() > 2 {
            let tail: String = digits[digits.len() - 2..].iter().collect();
            return format!("***{}", tail);
        }

        String::from("********")
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hint())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hint())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
