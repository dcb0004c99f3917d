use std::{borrow::Cow, str::FromStr};

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use hmac::{digest::InvalidLength, Hmac, Mac};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

const DEFAULT_ALGORITHM: TotpAlgorithm = TotpAlgorithm::Sha1;
const DEFAULT_DIGITS: u32 = 6;
const DEFAULT_PERIOD: u32 = 30;
const MAX_DIGITS: u32 = 10;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TotpError {
    #[error("Invalid OTP auth URI: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("Unsupported OTP auth URI, expected otpauth://totp/: {0}")]
    UnsupportedUri(String),
    #[error("The OTP auth URI has no secret")]
    MissingSecret,
    #[error("The OTP secret is not valid base32: {0}")]
    InvalidSecret(#[from] data_encoding::DecodeError),
    #[error("Unsupported OTP algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Invalid OTP digits: {0}")]
    InvalidDigits(String),
    #[error("Invalid OTP period: {0}")]
    InvalidPeriod(String),
    #[error(transparent)]
    InvalidKey(#[from] InvalidLength),
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TotpAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl FromStr for TotpAlgorithm {
    type Err = TotpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(TotpError::UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

/// A time-based one-time password generator, usually parsed from an `otpauth://totp/` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Totp {
    #[allow(missing_docs)]
    pub account: Option<String>,
    #[allow(missing_docs)]
    pub algorithm: TotpAlgorithm,
    #[allow(missing_docs)]
    pub digits: u32,
    #[allow(missing_docs)]
    pub issuer: Option<String>,
    /// Step size in seconds.
    pub period: u32,
    #[allow(missing_docs)]
    pub secret: Vec<u8>,
}

impl FromStr for Totp {
    type Err = TotpError;

    /// Parses `otpauth://totp/<label>?secret=...`.
    ///
    /// `algorithm`, `digits` and `period` default to SHA1, 6 and 30. The base32 secret may be
    /// lowercase, padded or contain spaces.
    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(uri.trim())?;
        if url.scheme() != "otpauth" || url.host_str() != Some("totp") {
            return Err(TotpError::UnsupportedUri(uri.to_owned()));
        }

        let label = percent_decode_str(url.path().trim_start_matches('/')).decode_utf8_lossy();
        let (label_issuer, account) = match label.split_once(':') {
            Some((issuer, account)) => (Some(issuer.trim()), account.trim()),
            None => (None, label.trim()),
        };

        let mut totp = Totp {
            account: Some(account.to_owned()).filter(|a| !a.is_empty()),
            algorithm: DEFAULT_ALGORITHM,
            digits: DEFAULT_DIGITS,
            issuer: label_issuer.map(str::to_owned),
            period: DEFAULT_PERIOD,
            secret: Vec::new(),
        };

        let mut secret = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "secret" => secret = Some(decode_secret(&value)?),
                "issuer" => totp.issuer = Some(value.into_owned()),
                "algorithm" => totp.algorithm = value.parse()?,
                "digits" => {
                    totp.digits = value
                        .parse()
                        .ok()
                        .filter(|d| (1..=MAX_DIGITS).contains(d))
                        .ok_or_else(|| TotpError::InvalidDigits(value.to_string()))?
                }
                "period" => {
                    totp.period = value
                        .parse()
                        .ok()
                        .filter(|p| *p > 0)
                        .ok_or_else(|| TotpError::InvalidPeriod(value.to_string()))?
                }
                _ => {}
            }
        }

        totp.secret = secret.ok_or(TotpError::MissingSecret)?;
        Ok(totp)
    }
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(TotpError::MissingSecret);
    }

    Ok(BASE32_NOPAD.decode(normalized.as_bytes())?)
}

impl Totp {
    /// The code valid at `time`.
    pub fn generate(&self, time: DateTime<Utc>) -> Result<String, TotpError> {
        let counter = time.timestamp().max(0) as u64 / u64::from(self.period);
        let hash = self.mac(&counter.to_be_bytes())?;

        let offset = usize::from(hash[hash.len() - 1] & 0x0f);
        let binary = u32::from_be_bytes([
            hash[offset],
            hash[offset + 1],
            hash[offset + 2],
            hash[offset + 3],
        ]) & 0x7fff_ffff;

        let code = u64::from(binary) % 10u64.pow(self.digits);
        Ok(format!("{code:0width$}", width = self.digits as usize))
    }

    /// The code valid now.
    pub fn generate_now(&self) -> Result<String, TotpError> {
        self.generate(Utc::now())
    }

    fn mac(&self, message: &[u8]) -> Result<Vec<u8>, TotpError> {
        macro_rules! hmac {
            ($digest:ty) => {{
                let mut mac = Hmac::<$digest>::new_from_slice(&self.secret)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }};
        }

        Ok(match self.algorithm {
            TotpAlgorithm::Sha1 => hmac!(sha1::Sha1),
            TotpAlgorithm::Sha256 => hmac!(sha2::Sha256),
            TotpAlgorithm::Sha512 => hmac!(sha2::Sha512),
        })
    }

    /// `issuer:account` as shown by authenticator apps.
    pub fn label(&self) -> Cow<'_, str> {
        match (&self.issuer, &self.account) {
            (Some(issuer), Some(account)) => Cow::Owned(format!("{issuer}:{account}")),
            (None, Some(account)) => Cow::Borrowed(account),
            (Some(issuer), None) => Cow::Borrowed(issuer),
            (None, None) => Cow::Borrowed(""),
        }
    }
}

/// Parse `otp_auth_uri` and derive the code valid now.
pub fn generate_otp(otp_auth_uri: &str) -> Result<String, TotpError> {
    otp_auth_uri.parse::<Totp>()?.generate_now()
}
