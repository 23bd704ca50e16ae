use secrecy::SecretString;

/// Account credentials for the Govee app API.
///
/// Owned by exactly one [`GoveeClient`](crate::GoveeClient) and never
/// written to disk by this crate.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn debug_does_not_leak_password() {
        let creds = Credentials::new("me@example.com", "hunter2".to_string().into());
        assert_eq!(creds.password().expose_secret(), "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
