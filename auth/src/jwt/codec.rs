use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::AccessClaims;
use super::errors::JwtError;

/// Access token codec.
///
/// Issues and verifies compact signed tokens carrying a subject and an expiry.
/// Signing is HS256 with a shared secret; verification pins that algorithm and
/// never trusts the `alg` value found in a token header.
///
/// Expiry is judged against the `now` supplied by the caller rather than the
/// system clock, so the service's clock is the single source of time.
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl AccessTokenCodec {
    /// Create a new codec.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `ttl` - Lifetime of every issued token
    ///
    /// # Errors
    /// * `EmptySecret` - No secret was supplied
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Changing the secret invalidates every outstanding access token at once
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl,
        })
    }

    /// Lifetime of the tokens this codec issues.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, valid from `now` until `now + ttl`.
    ///
    /// # Returns
    /// The signed token and the claims it carries
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, AccessClaims), JwtError> {
        let claims = AccessClaims::new(subject, now, self.ttl);
        let header = Header::new(self.algorithm);

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok((token, claims))
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    /// * `Malformed` - Token is not a structurally valid JWT for these claims
    /// * `SignatureInvalid` - Signature mismatch or unexpected algorithm
    /// * `Expired` - `now` is at or past the token's `exp`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, JwtError> {
        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &self.validation()).map_err(
                |e| match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        JwtError::SignatureInvalid
                    }
                    _ => JwtError::Malformed(e.to_string()),
                },
            )?;

        // `validate_exp` is off; this is the only expiry decision.
        let claims = token_data.claims;
        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = vec![self.algorithm];
        // Expiry is checked against the caller's clock in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}
