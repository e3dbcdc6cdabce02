use serde::{Deserialize, Serialize};

/// Claims carried by the domain-wide session credential (the cookie value).
///
/// Issued by the session authority after a proof-of-identity token verifies,
/// and read back by the status and exchange endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Identity provider user id.
    pub uid: String,

    /// Email address, if the identity has one.
    pub email: Option<String>,

    /// Whether the identity provider has verified the email.
    #[serde(default)]
    pub email_verified: bool,

    /// Issued at (Unix timestamp). Compared against upstream revocation time.
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for `uid` issued at `now` and valid for `ttl_secs`.
    pub fn new(
        uid: impl Into<String>,
        email: Option<String>,
        email_verified: bool,
        now: i64,
        ttl_secs: i64,
    ) -> Self {
        Self {
            uid: uid.into(),
            email,
            email_verified,
            iat: now,
            exp: now + ttl_secs,
        }
    }

    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
        }
    }
}

/// The identity summary exposed to callers once a session resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_new_sets_future_exp() {
        let claims = SessionClaims::new("user123", None, false, 1_700_000_000, 3600);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
    }

    #[test]
    fn test_session_claims_wire_names() {
        let claims = SessionClaims::new(
            "user123",
            Some("user@example.com".to_string()),
            true,
            1_700_000_000,
            60,
        );

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["uid"], "user123");
        assert_eq!(json["emailVerified"], true);
        assert_eq!(json["exp"], 1_700_000_060);
    }

    #[test]
    fn test_email_verified_defaults_to_false() {
        let parsed: SessionClaims =
            serde_json::from_str(r#"{"uid":"u1","email":null,"iat":1,"exp":2}"#).unwrap();
        assert!(!parsed.email_verified);
        assert_eq!(parsed.identity().uid, "u1");
    }
}
