use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Config processor that strips one pair of matching quotes.
///
/// Paths in the config file are usually written as `"train.csv"`, while the
/// same value coming from an environment variable is bare. Both `"..."` and
/// `'...'` are accepted; unquoted values are passed through trimmed.
pub trait StripQuotes
where
    Self: Sized,
{
    fn strip_quotes(self) -> Result<StringItem, ConfigError>;
}

impl StripQuotes for Result<StringItem, ConfigError> {
    fn strip_quotes(self) -> Result<StringItem, ConfigError> {
        self?.map(|raw| {
            let value = raw.trim();
            match strip_matching_quotes(value) {
                Some(inner) => MapAction::Replace(vec![inner.to_owned()]),
                None if value.len() != raw.len() => MapAction::Replace(vec![value.to_owned()]),
                None => MapAction::Keep,
            }
        })
    }
}

fn strip_matching_quotes(value: &str) -> Option<&str> {
    ['"', '\''].iter().find_map(|&quote| {
        value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}
