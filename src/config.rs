//! Emission settings. Built by the CLI; `Default` matches the plain writer.

/// How node content and info payloads are normalized before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Written as-is with trailing whitespace trimmed.
    #[default]
    Verbatim,
    /// Embedded newlines replaced by a space, then trailing-trimmed.
    Flatten,
}

impl ContentMode {
    pub fn normalize(self, text: &str) -> String {
        match self {
            ContentMode::Verbatim => text.trim_end().to_string(),
            ContentMode::Flatten => text
                .trim_end()
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Which group qualifies an id passed without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qualify {
    /// Fall back to the group most recently selected with `select_group`.
    #[default]
    Current,
    /// Only an explicitly passed group qualifies an id.
    Explicit,
}

/// Scope of the payload cache consulted by the `record_*` driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DedupScope {
    /// One cache for the whole session, keyed by subject + tag.
    #[default]
    Session,
    /// The cache is cleared at every selectgroup.
    Group,
    /// Never reference; `record_*` always declares.
    Off,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitConfig {
    pub content: ContentMode,
    pub qualify: Qualify,
    pub dedup: DedupScope,
}
