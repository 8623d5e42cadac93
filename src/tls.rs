//! Client identity and the mutually authenticated HTTPS client.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Identity;
use tracing::debug;

use crate::Error;

/// Paths of the PEM encoded client certificate and its private key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIdentity {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ClientIdentity {
    /// Fails with [Error::CertificateNotFound] for the first file that does not exist.
    pub fn ensure_files_exist(&self) -> Result<(), Error> {
        for path in [&self.cert, &self.key] {
            if !path.exists() {
                return Err(Error::CertificateNotFound(path.clone()));
            }
            debug!("Certificate file: {} found.", path.display());
        }
        Ok(())
    }

    /// Reads certificate and key into one identity.
    pub fn load(&self) -> Result<Identity, Error> {
        debug!(
            "Trying to load cert file: {} and key file: {}",
            self.cert.display(),
            self.key.display()
        );

        let mut pem = read(&self.cert)?;
        pem.push(b'\n');
        pem.extend(read(&self.key)?);

        Identity::from_pem(&pem).map_err(Error::Identity)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::ReadIdentity {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds the client for the single status request. It presents the client identity and
/// accepts any server certificate.
pub fn build_client(identity: &ClientIdentity, timeout: Duration) -> Result<Client, Error> {
    identity.ensure_files_exist()?;
    let identity = identity.load()?;

    Client::builder()
        .use_rustls_tls()
        .identity(identity)
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .timeout(timeout)
        .build()
        .map_err(Error::Client)
}
