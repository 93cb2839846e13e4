//! OpenID Connect identity provider adapter

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::thirdparty::{http_client, ThirdPartyAuthHelper};
use crate::domain::ThirdPartyIdentity;
use crate::error::{CoreError, Result};

const SCOPES: &str = "openid profile email";

/// Settings for [`OidcAuthHelper`]
#[derive(Clone, Default)]
pub struct OidcConfig {
    /// Issuer URL; discovery reads `<provider_url>/.well-known/openid-configuration`
    pub provider_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the provider
    pub redirect_url: String,
}

impl fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcConfig")
            .field("provider_url", &self.provider_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// The parts of a provider's discovery document this adapter uses
#[derive(Debug, Clone, Deserialize)]
pub struct OidcProvider {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
}

impl OidcProvider {
    /// Fetches and checks the provider's discovery document
    pub async fn discover(client: &reqwest::Client, provider_url: &str) -> anyhow::Result<Self> {
        let url = format!(
            "{}/.well-known/openid-configuration",
            provider_url.trim_end_matches('/')
        );
        let provider: Self = client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("error fetching OpenID Connect discovery document {url}"))?
            .json()
            .await
            .with_context(|| format!("error decoding OpenID Connect discovery document {url}"))?;

        if provider.issuer.trim_end_matches('/') != provider_url.trim_end_matches('/') {
            bail!(
                "issuer {:?} in discovery document does not match provider URL {:?}",
                provider.issuer,
                provider_url
            );
        }
        Ok(provider)
    }
}

/// Claims read from a verified ID token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Checks an ID token's signature and standard claims
pub trait IdTokenVerifier: Send + Sync {
    fn verify(&self, id_token: &str) -> anyhow::Result<IdTokenClaims>;
}

/// [`IdTokenVerifier`] backed by the provider's published key set
///
/// Validates signature, expiry, issuer and audience (the client id).
pub struct JwksVerifier {
    keys: JwkSet,
    issuer: String,
    client_id: String,
}

impl JwksVerifier {
    pub fn new(keys: JwkSet, issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            client_id: client_id.into(),
        }
    }

    pub async fn fetch(
        client: &reqwest::Client,
        jwks_uri: &str,
        issuer: &str,
        client_id: &str,
    ) -> anyhow::Result<Self> {
        let keys: JwkSet = client
            .get(jwks_uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("error fetching JWKS {jwks_uri}"))?
            .json()
            .await
            .with_context(|| format!("error decoding JWKS {jwks_uri}"))?;
        debug!(jwks_uri, keys = keys.keys.len(), "loaded OpenID Connect signing keys");
        Ok(Self::new(keys, issuer, client_id))
    }
}

impl IdTokenVerifier for JwksVerifier {
    fn verify(&self, id_token: &str) -> anyhow::Result<IdTokenClaims> {
        let header = jsonwebtoken::decode_header(id_token).context("malformed ID token header")?;
        let jwk = match header.kid.as_deref() {
            Some(kid) => self.keys.find(kid),
            None if self.keys.keys.len() == 1 => self.keys.keys.first(),
            None => None,
        }
        .ok_or_else(|| anyhow!("no signing key matches the ID token"))?;

        // The token names its own algorithm; only accept one that belongs to
        // the key's family.
        if !algorithm_fits_key(header.alg, &jwk.algorithm) {
            bail!("ID token algorithm {:?} does not fit its signing key", header.alg);
        }

        let key = DecodingKey::from_jwk(jwk).context("unusable signing key")?;
        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.client_id]);

        let data = jsonwebtoken::decode::<IdTokenClaims>(id_token, &key, &validation)
            .context("ID token failed validation")?;
        Ok(data.claims)
    }
}

fn algorithm_fits_key(alg: Algorithm, key: &AlgorithmParameters) -> bool {
    use Algorithm::*;

    #[allow(unreachable_patterns)]
    match key {
        AlgorithmParameters::RSA(_) => {
            matches!(alg, RS256 | RS384 | RS512 | PS256 | PS384 | PS512)
        }
        AlgorithmParameters::EllipticCurve(_) => matches!(alg, ES256 | ES384),
        AlgorithmParameters::OctetKeyPair(_) => matches!(alg, EdDSA),
        AlgorithmParameters::OctetKey(_) => matches!(alg, HS256 | HS384 | HS512),
        _ => false,
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// [`ThirdPartyAuthHelper`] for any OpenID Connect provider
pub struct OidcAuthHelper {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    authorization_endpoint: Url,
    token_endpoint: String,
    verifier: Arc<dyn IdTokenVerifier>,
}

impl OidcAuthHelper {
    /// Runs discovery, loads the provider's keys and builds the helper
    pub async fn connect(config: OidcConfig) -> anyhow::Result<Self> {
        let client = http_client()?;
        let provider = OidcProvider::discover(&client, &config.provider_url).await?;
        let verifier =
            JwksVerifier::fetch(&client, &provider.jwks_uri, &provider.issuer, &config.client_id)
                .await?;
        Self::with_verifier(client, config, &provider, Arc::new(verifier))
    }

    pub fn with_verifier(
        client: reqwest::Client,
        config: OidcConfig,
        provider: &OidcProvider,
        verifier: Arc<dyn IdTokenVerifier>,
    ) -> anyhow::Result<Self> {
        let authorization_endpoint = Url::parse(&provider.authorization_endpoint)
            .with_context(|| {
                format!(
                    "invalid authorization endpoint {:?}",
                    provider.authorization_endpoint
                )
            })?;
        Ok(Self {
            client,
            client_id: config.client_id,
            client_secret: config.client_secret,
            redirect_url: config.redirect_url,
            authorization_endpoint,
            token_endpoint: provider.token_endpoint.clone(),
            verifier,
        })
    }
}

#[async_trait]
impl ThirdPartyAuthHelper for OidcAuthHelper {
    fn auth_url(&self, oauth2_state: &str) -> String {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", SCOPES)
            .append_pair("state", oauth2_state);
        url.into()
    }

    async fn exchange(&self, _oauth2_state: &str, oauth2_code: &str) -> Result<ThirdPartyIdentity> {
        let response = self
            .client
            .post(&self.token_endpoint)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", oauth2_code),
                ("redirect_uri", self.redirect_url.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .context("error exchanging OAuth2 code for token")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("token endpoint responded with {status}").into());
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("error decoding OAuth2 token response")?;

        let id_token = token
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("no id_token field in OAuth2 token response"))?;
        let claims = self
            .verifier
            .verify(&id_token)
            .context("error verifying OpenID Connect ID token")?;

        identity_from_claims(claims)
    }
}

fn identity_from_claims(claims: IdTokenClaims) -> Result<ThirdPartyIdentity> {
    if claims.email_verified == Some(false) {
        return Err(CoreError::authentication(
            "the identity provider has not verified this email address",
        ));
    }
    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| CoreError::authentication("ID token carries no email claim"))?;
    let name = claims
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.clone());
    Ok(ThirdPartyIdentity { id: email, name })
}
