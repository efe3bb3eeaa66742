use secrecy::SecretString;

/// Immutable process-wide configuration, loaded once at startup.
///
/// The signing secret lives here and is injected into the token service;
/// nothing else ever reads it and `Debug` redacts it.
#[derive(Clone)]
pub struct GlobalArgs {
    pub environment: String,
    pub jwt_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(environment: String, jwt_secret: SecretString) -> Self {
        Self {
            environment,
            jwt_secret,
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("environment", &self.environment)
            .field("jwt_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new("local".to_string(), SecretString::from("s3cret"));
        assert_eq!(args.environment, "local");
        assert_eq!(args.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let args = GlobalArgs::new("prod".to_string(), SecretString::from("s3cret"));
        let debug = format!("{args:?}");
        assert!(debug.contains("prod"));
        assert!(!debug.contains("s3cret"));
    }
}
