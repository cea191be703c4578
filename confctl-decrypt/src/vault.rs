use std::env;

use serde_json::json;

use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::Decrypter;

/// Default marker for a secret-store-encoded value in `secrets.yaml`
/// (§4.3, GLOSSARY "Ciphertext prefix"). Kept as a plain constant rather
/// than a compiled regex since it's only ever checked as a `starts_with`.
pub const CIPHERTEXT_PREFIX: &str = "vault:v1:";

pub fn is_ciphertext(s: &str) -> bool {
    s.starts_with(CIPHERTEXT_PREFIX)
}

fn default_addr() -> Result<String> {
    env::var("VAULT_ADDR").map_err(|_| ErrorKind::MissingVaultAddr.into())
}

fn file_token_fallback() -> Result<String> {
    use std::fs::File;
    use std::io::Read;

    let path = dirs::home_dir()
        .ok_or(ErrorKind::NoHomeDirectory)?
        .join(".vault-token");
    let mut f = File::open(path)?;
    let mut token = String::new();
    f.read_to_string(&mut token)?;
    Ok(token.trim().to_string())
}

fn default_token() -> Result<String> {
    env::var("VAULT_TOKEN")
        .or_else(|_| file_token_fallback())
        .chain_err(|| ErrorKind::MissingVaultToken)
}

/// HTTP client against Vault's transit decrypt endpoint
/// (`POST {addr}/v1/transit/decrypt/{key}`), the default `Decrypter`
/// (§4.3). Grounded on `shipcat_definitions::vault::Vault`'s client shape
/// (a `reqwest::Client` plus address and token), adapted from reading
/// plain k/v secrets to transit-decrypting an opaque ciphertext blob,
/// since this engine decrypts whole YAML leaves rather than fetching
/// named secrets (see DESIGN.md).
pub struct VaultDecrypter {
    client: reqwest::blocking::Client,
    addr: reqwest::Url,
    token: String,
    transit_key: String,
}

impl VaultDecrypter {
    pub fn from_env(transit_key: &str) -> Result<VaultDecrypter> {
        let addr = default_addr()?;
        let token = default_token()?;
        VaultDecrypter::new(&addr, token, transit_key)
    }

    pub fn new<S: Into<String>>(addr: &str, token: S, transit_key: &str) -> Result<VaultDecrypter> {
        let addr = addr
            .parse::<reqwest::Url>()
            .map_err(|e| Error::from(ErrorKind::DecryptFailed("<init>".into(), e.to_string())))?;
        Ok(VaultDecrypter {
            client: reqwest::blocking::Client::new(),
            addr,
            token: token.into(),
            transit_key: transit_key.to_string(),
        })
    }
}

impl Decrypter for VaultDecrypter {
    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let url = self
            .addr
            .join(&format!("v1/transit/decrypt/{}", self.transit_key))
            .map_err(|e| Error::from(ErrorKind::DecryptFailed(ciphertext.to_string(), e.to_string())))?;
        debug!("POST {}", url);

        let res = self
            .client
            .post(url.clone())
            .header("X-Vault-Token", self.token.clone())
            .json(&json!({ "ciphertext": ciphertext }))
            .send()?;

        if !res.status().is_success() {
            return Err(ErrorKind::UnexpectedHttpStatus(res.status().as_u16()).into());
        }

        #[derive(serde::Deserialize)]
        struct DecryptResponse {
            data: DecryptData,
        }
        #[derive(serde::Deserialize)]
        struct DecryptData {
            plaintext: String,
        }

        let body: DecryptResponse = res.json()?;
        let raw = base64::decode(&body.data.plaintext)
            .map_err(|e| Error::from(ErrorKind::DecryptFailed(ciphertext.to_string(), e.to_string())))?;
        String::from_utf8(raw).map_err(|e| ErrorKind::DecryptFailed(ciphertext.to_string(), e.to_string()).into())
    }
}
