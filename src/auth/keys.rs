// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ed25519 signing keys for access tokens.
//!
//! The private key is kept as PKCS#8 DER inside a `PRIVATE KEY` PEM block.
//! When `SIGNING_KEY_PATH` is set the key survives restarts; without it
//! every process start generates a fresh key and invalidates all tokens.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use tracing::{info, warn};

const PEM_TAG: &str = "PRIVATE KEY";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Matched encoding/decoding pair for one Ed25519 key.
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    /// Generate a new random key pair.
    pub fn generate() -> Result<Self, KeyError> {
        let document = generate_pkcs8()?;
        Self::from_pkcs8(document.as_ref())
    }

    /// Build from PKCS#8 DER bytes.
    pub fn from_pkcs8(der: &[u8]) -> Result<Self, KeyError> {
        let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(Self {
            encoding: EncodingKey::from_ed_der(der),
            decoding: DecodingKey::from_ed_der(pair.public_key().as_ref()),
        })
    }

    /// Load the key at `path`, or create and persist one if the file is absent.
    pub fn load_or_generate(path: &Path) -> Result<Self, KeyError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = generate_pkcs8()?;
        let keys = Self::from_pkcs8(document.as_ref())?;
        let encoded = pem::encode(&pem::Pem::new(PEM_TAG, document.as_ref().to_vec()));

        let mut file = match create_key_file(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Self::load(path),
            Err(e) => return Err(e.into()),
        };
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;

        info!(path = %path.display(), "Generated and stored new token signing key");
        Ok(keys)
    }

    fn load(path: &Path) -> Result<Self, KeyError> {
        let pem = pem::parse(fs::read(path)?)?;
        if pem.tag() != PEM_TAG {
            return Err(KeyError::InvalidKey(format!(
                "expected a {PEM_TAG} block, found {}",
                pem.tag()
            )));
        }
        let keys = Self::from_pkcs8(pem.contents())?;
        info!(path = %path.display(), "Loaded token signing key");
        Ok(keys)
    }

    /// Ephemeral key for deployments without `SIGNING_KEY_PATH`.
    pub fn ephemeral() -> Result<Self, KeyError> {
        warn!("SIGNING_KEY_PATH not set; using an ephemeral signing key, tokens will not survive a restart");
        Self::generate()
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn generate_pkcs8() -> Result<ring::pkcs8::Document, KeyError> {
    Ed25519KeyPair::generate_pkcs8(&SystemRandom::new())
        .map_err(|_| KeyError::InvalidKey("key generation failed".to_string()))
}

/// Create the key file exclusively, owner read/write only from the start.
fn create_key_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
