use crate::config::types::Options;
use crate::config::validation::prepare;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses an options file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML options file
///
/// # Returns
///
/// * `Ok(Options)` - Successfully loaded and validated options
/// * `Err(ConfigError)` - Failed to load, parse, or validate the options
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rustbuster::config::load_options;
///
/// let options = load_options(Path::new("scan.toml")).unwrap();
/// println!("Mode: {}", options.mode.as_str());
/// ```
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_options(&content)
}

/// Parses and validates options from a TOML string
pub fn parse_options(content: &str) -> Result<Options, ConfigError> {
    let options: Options = toml::from_str(content)?;
    prepare(options)
}

/// Parses a comma separated list of status codes, e.g. `"200,204,301"`
pub fn parse_status_codes(list: &str) -> Result<Vec<u16>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<u16>()
                .map_err(|_| ConfigError::Validation(format!("invalid status code '{}'", code)))
        })
        .collect()
}
