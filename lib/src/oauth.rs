// Copyright (c) 2022-2023 The MobileCoin Foundation

//! OAuth login via a platform web authentication session

use log::debug;
use url::Url;

use crate::{decode, handle::ParaHandle, host::ScriptHost, passkey::OAuthSession, Error};

/// Supported OAuth providers
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum OAuthProvider {
    #[strum(serialize = "GOOGLE")]
    Google,
    #[strum(serialize = "DISCORD")]
    Discord,
    #[strum(serialize = "APPLE")]
    Apple,
}

impl<H: ScriptHost> ParaHandle<H> {
    /// Callback scheme for OAuth redirects
    fn callback_scheme(&self) -> Result<&str, Error<H::Error>> {
        match self.config().deeplink_url.as_deref() {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(Error::InvalidConfig(
                "deeplink_url is required for OAuth".to_string(),
            )),
        }
    }

    /// Fetch the authorisation URL for the provided OAuth provider
    pub async fn oauth_url(&self, provider: OAuthProvider) -> Result<String, Error<H::Error>> {
        let scheme = self.callback_scheme()?;

        let v = self
            .call("getOAuthURL", &[provider.to_string().as_str(), scheme])
            .await?;
        decode::string("getOAuthURL", &v)
    }

    /// Run an OAuth flow with the provided session, returning the email
    /// address reported in the callback
    pub async fn oauth_connect<S: OAuthSession>(
        &self,
        provider: OAuthProvider,
        session: &S,
    ) -> Result<String, Error<H::Error>> {
        let url = self.oauth_url(provider).await?;
        Url::parse(&url).map_err(|e| Error::OAuth(format!("invalid url: {e}")))?;

        debug!("Starting {} OAuth session", provider);

        let callback = session
            .authenticate(&url, self.callback_scheme()?)
            .await
            .map_err(|e| Error::OAuth(e.to_string()))?;

        callback_email(&callback).ok_or_else(|| Error::OAuth("no email in callback".to_string()))
    }
}

/// Extract the `email` query parameter from a callback URL
fn callback_email(callback: &str) -> Option<String> {
    let u = Url::parse(callback).ok()?;

    u.query_pairs()
        .find(|(k, _)| k == "email")
        .map(|(_, v)| v.into_owned())
}
