use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static RADIO_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"radio([0-9]+)").ok());

/// Short `radio<N>` label for an item page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Identifier(String);

impl Identifier {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the played state is persisted.
    pub(crate) fn storage_key(&self) -> String {
        format!("radio-{}", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn derive_id(item_url: &str) -> Option<Identifier> {
    let caps = RADIO_NUMBER.as_ref()?.captures(item_url)?;
    Some(Identifier(format!("radio{}", &caps[1])))
}

#[cfg(test)]
pub(crate) fn test_id(raw: &str) -> Identifier {
    Identifier(raw.to_string())
}
