use crate::core::stt::STTProvider;

/// Validate the configured default provider name
pub fn validate_provider(asr_provider: &str) -> Result<(), Box<dyn std::error::Error>> {
    asr_provider.parse::<STTProvider>()?;
    Ok(())
}

/// Reject port 0
pub fn validate_port(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if port == 0 {
        return Err("PORT must be between 1 and 65535".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_provider() {
        assert!(validate_provider("volcengine").is_ok());
        assert!(validate_provider("ALIBABA").is_ok());

        let err = validate_provider("google").unwrap_err();
        assert!(err.to_string().contains("Unsupported STT provider: google"));
    }

    #[test]
    fn test_validate_port() {
        assert!(validate_port(3001).is_ok());
        assert!(validate_port(0).is_err());
    }
}
