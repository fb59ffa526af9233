use serde::Serialize;
use crate::models::parse_error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    Basic,
    Digest,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "basic",
            AuthScheme::Digest => "digest",
        }
    }
}

/// Credentials resolved from an `auth` string such as `"basic user pass"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Auth {
    pub scheme: AuthScheme,
    pub username: String,
    pub password: String,
}

impl Auth {
    pub(crate) fn parse(field: &str, value: &str) -> Result<Auth, ParseError> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [scheme, username, password] = parts.as_slice() else {
            return Err(ParseError::invalid_value(
                field,
                format!("expected `<scheme> <username> <password>`, got {} token(s)", parts.len()),
            ));
        };
        let scheme = match *scheme {
            "basic" => AuthScheme::Basic,
            "digest" => AuthScheme::Digest,
            other => {
                return Err(ParseError::invalid_value(
                    field,
                    format!("unknown auth scheme `{}`", other),
                ))
            }
        };
        Ok(Auth {
            scheme,
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_and_digest() {
        let auth = Auth::parse("auth", "basic u p").unwrap();
        assert_eq!(auth.scheme, AuthScheme::Basic);
        assert_eq!(auth.username, "u");
        assert_eq!(auth.password, "p");

        let auth = Auth::parse("auth", "digest  alice\tsecret").unwrap();
        assert_eq!(auth.scheme, AuthScheme::Digest);
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password, "secret");
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = Auth::parse("auth", "ftp u p").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn scheme_is_case_sensitive() {
        assert!(Auth::parse("auth", "Basic u p").is_err());
    }

    #[test]
    fn requires_three_tokens() {
        assert!(Auth::parse("auth", "basic user").is_err());
        assert!(Auth::parse("auth", "basic user pass extra").is_err());
        assert!(Auth::parse("auth", "").is_err());
    }
}
