//! TLS setup for the HTTP transport. Roots come from webpki-roots.

use std::sync::Arc;

use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;

use crate::config::TransportSecurity;
use crate::error::HttpError;

/// Get the crypto provider for TLS connections.
///
/// Uses the globally installed default provider if there is one, otherwise
/// an aws-lc-rs provider that is not installed globally.
#[must_use]
pub fn get_crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Build the HTTPS connector.
///
/// ALPN advertises both h2 and http/1.1. Plain `http://` is only accepted
/// with [`TransportSecurity::AllowInsecureHttp`].
///
/// # Errors
///
/// Returns `HttpError::Tls` if the provider cannot be configured.
pub fn build_https_connector(
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(get_crypto_provider())
        .map_err(|e| HttpError::Tls(Box::new(e)))?;
    let connector = if transport == TransportSecurity::AllowInsecureHttp {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(connector)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn provider_is_reused() {
        let a = get_crypto_provider();
        let b = get_crypto_provider();
        assert_eq!(a.cipher_suites.len(), b.cipher_suites.len());
    }

    #[test]
    fn connector_builds_for_both_modes() {
        assert!(build_https_connector(TransportSecurity::TlsOnly).is_ok());
        assert!(build_https_connector(TransportSecurity::AllowInsecureHttp).is_ok());
    }
}
