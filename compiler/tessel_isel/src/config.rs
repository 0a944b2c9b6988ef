//! Selection settings.

use tracing::warn;

/// Knobs for [`Selector`](crate::Selector).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectConfig {
    /// Stop collecting tiles for a node once this many are found.
    /// `None` enumerates every combination.
    pub max_tiles_per_node: Option<usize>,
    /// Drop tiles identical (parts, covered, inputs) to one already kept.
    pub dedup: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            max_tiles_per_node: Some(64),
            dedup: true,
        }
    }
}

impl SelectConfig {
    #[must_use]
    pub fn with_max_tiles(mut self, max: Option<usize>) -> Self {
        self.max_tiles_per_node = max;
        self
    }

    #[must_use]
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Whether `count` tiles already reach the cap. A cap below one still
    /// lets the first tile through, so capping never uncovers a node.
    #[inline]
    pub fn is_full(&self, count: usize) -> bool {
        self.max_tiles_per_node.is_some_and(|max| count >= max.max(1))
    }

    /// Apply one command-line flag. Returns `false` if the flag is not a
    /// selection flag, so callers can try their own.
    ///
    /// - `--max-tiles=N` caps tiles per node (`--max-tiles=none` removes the cap)
    /// - `--no-dedup` keeps duplicate tiles
    pub fn apply_flag(&mut self, arg: &str) -> bool {
        if let Some(value) = arg.strip_prefix("--max-tiles=") {
            if value == "none" {
                self.max_tiles_per_node = None;
            } else if let Some(max) = value.parse::<usize>().ok().filter(|&max| max > 0) {
                self.max_tiles_per_node = Some(max);
            } else {
                warn!(value, current = ?self.max_tiles_per_node, "invalid tile cap, ignored");
            }
            true
        } else if arg == "--no-dedup" {
            self.dedup = false;
            true
        } else {
            false
        }
    }
}

/// Parse selection flags, ignoring anything else.
pub fn parse_select_options(args: &[String]) -> SelectConfig {
    let mut config = SelectConfig::default();
    for arg in args {
        config.apply_flag(arg);
    }
    config
}
