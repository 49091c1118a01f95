//! Tunables for the engine.
//!
//! `EngineConfig` is constructed once at process start and handed to
//! [`MatchEngine::new`](crate::application::engine::MatchEngine::new).

pub const DEFAULT_MAX_SWIPES_PER_DAY: u32 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 10;
pub const DEFAULT_CURSOR_SALT: &str = "Curs0rS4ltF0rM4tchC0re";
pub const DEFAULT_UNLIMITED_SWIPE_TITLE: &str = "Unlimited Swipe";
pub const DEFAULT_VERIFICATION_TITLE: &str = "Verified Label";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Swipes an account without the unlimited entitlement may record per UTC day.
    pub max_swipes_per_day: u32,
    /// Upper bound applied to every requested page size.
    pub max_page_size: usize,
    /// Key material for the cursor codec.
    pub cursor_salt: String,
    /// Package title whose purchase lifts the daily swipe limit.
    pub unlimited_swipe_title: String,
    /// Package title whose purchase marks the buyer as verified.
    pub verification_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_swipes_per_day: DEFAULT_MAX_SWIPES_PER_DAY,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            cursor_salt: DEFAULT_CURSOR_SALT.to_string(),
            unlimited_swipe_title: DEFAULT_UNLIMITED_SWIPE_TITLE.to_string(),
            verification_title: DEFAULT_VERIFICATION_TITLE.to_string(),
        }
    }
}

/// Command-line and environment overrides for [`EngineConfig`].
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// Swipes a free account may record per UTC day
    #[arg(long, env = "MATCHCORE_MAX_SWIPES_PER_DAY", default_value_t = DEFAULT_MAX_SWIPES_PER_DAY)]
    pub max_swipes_per_day: u32,

    /// Upper bound on requested page sizes
    #[arg(long, env = "MATCHCORE_MAX_PAGE_SIZE", default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: usize,

    /// Key material for pagination cursors
    #[arg(long, env = "MATCHCORE_CURSOR_SALT", default_value = DEFAULT_CURSOR_SALT, hide_env_values = true)]
    pub cursor_salt: String,

    /// Package title that lifts the daily swipe limit
    #[arg(long, env = "MATCHCORE_UNLIMITED_SWIPE_TITLE", default_value = DEFAULT_UNLIMITED_SWIPE_TITLE)]
    pub unlimited_swipe_title: String,

    /// Package title that marks the buyer as verified
    #[arg(long, env = "MATCHCORE_VERIFICATION_TITLE", default_value = DEFAULT_VERIFICATION_TITLE)]
    pub verification_title: String,
}

impl From<EngineArgs> for EngineConfig {
    fn from(args: EngineArgs) -> Self {
        Self {
            max_swipes_per_day: args.max_swipes_per_day,
            max_page_size: args.max_page_size,
            cursor_salt: args.cursor_salt,
            unlimited_swipe_title: args.unlimited_swipe_title,
            verification_title: args.verification_title,
        }
    }
}
