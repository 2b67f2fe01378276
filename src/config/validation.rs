use crate::config::types::{DirOptions, DnsOptions, GeneralOptions, HttpOptions, Mode, Options};
use crate::ConfigError;
use std::net::{IpAddr, SocketAddr};
use url::Url;

const MAX_THREADS: usize = 1000;

/// Normalizes and validates a freshly built set of options
///
/// This is the single gate every [`Options`] value passes before a run uses
/// it. The dir target URL gets a trailing slash so words can be appended.
pub fn prepare(mut options: Options) -> Result<Options, ConfigError> {
    if options.mode == Mode::Dir && !options.http.url.is_empty() && !options.http.url.ends_with('/')
    {
        options.http.url.push('/');
    }

    validate(&options)?;
    Ok(options)
}

/// Validates the entire set of options
pub fn validate(options: &Options) -> Result<(), ConfigError> {
    validate_general_options(&options.general)?;
    validate_http_options(&options.http)?;

    match options.mode {
        Mode::Dir => {
            validate_target_url(&options.http.url)?;
            validate_dir_options(&options.dir)?;
        }
        Mode::Dns => validate_dns_options(&options.dns)?,
    }

    Ok(())
}

/// Validates options shared by every mode
fn validate_general_options(options: &GeneralOptions) -> Result<(), ConfigError> {
    if options.threads < 1 || options.threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and {}, got {}",
            MAX_THREADS, options.threads
        )));
    }

    if options.wordlist.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "wordlist must be set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the HTTP transport options
///
/// These are checked in every mode: the probe client is built from them
/// whatever strategy runs.
fn validate_http_options(options: &HttpOptions) -> Result<(), ConfigError> {
    if options.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0".to_string(),
        ));
    }

    if let Some(proxy) = &options.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    }

    match (&options.username, &options.password) {
        (None, Some(_)) => {
            return Err(ConfigError::Validation(
                "password given without a username".to_string(),
            ))
        }
        (Some(user), None) => {
            return Err(ConfigError::Validation(format!(
                "username '{}' given without a password",
                user
            )))
        }
        _ => {}
    }

    Ok(())
}

/// Validates the dir target URL
fn validate_target_url(url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::Validation("url must be set".to_string()));
    }

    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "url '{}' must use the http or https scheme",
            url
        )));
    }

    Ok(())
}

/// Validates dir options
fn validate_dir_options(options: &DirOptions) -> Result<(), ConfigError> {
    if options.status_codes.is_empty() {
        return Err(ConfigError::Validation(
            "at least one status code is required".to_string(),
        ));
    }

    if let Some(code) = options
        .status_codes
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(ConfigError::Validation(format!(
            "status code {} is out of range",
            code
        )));
    }

    Ok(())
}

/// Validates dns options
fn validate_dns_options(options: &DnsOptions) -> Result<(), ConfigError> {
    if options.domain.is_empty() {
        return Err(ConfigError::Validation("domain must be set".to_string()));
    }

    if options.domain.contains("://") || options.domain.contains('/') {
        return Err(ConfigError::Validation(format!(
            "domain '{}' must be a bare domain name",
            options.domain
        )));
    }

    if options.timeout == 0 {
        return Err(ConfigError::Validation(
            "dns timeout must be greater than 0".to_string(),
        ));
    }

    if let Some(resolver) = &options.resolver {
        parse_resolver(resolver)?;
    }

    Ok(())
}

/// Parses a resolver address, defaulting to port 53
pub fn parse_resolver(resolver: &str) -> Result<SocketAddr, ConfigError> {
    if let Ok(addr) = resolver.parse::<SocketAddr>() {
        return Ok(addr);
    }

    resolver
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ConfigError::Validation(format!("invalid resolver address '{}'", resolver)))
}
