//! Process-environment mirror of the last acquired text.
//!
//! Extension scripts launched by the dispatch surface read the selection
//! from `POPCLIP_TEXT` and `XPOP_TEXT`. The variables hold an empty
//! string, never unset, while no text is held.

/// Variables mirrored by default.
pub const DEFAULT_VARS: [&str; 2] = ["POPCLIP_TEXT", "XPOP_TEXT"];

#[derive(Debug, Clone)]
pub struct EnvMirror {
    vars: Vec<String>,
}

impl EnvMirror {
    /// Mirror into `vars`, initialising each to the empty string.
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mirror = Self {
            vars: vars.into_iter().map(Into::into).collect(),
        };
        mirror.set("");
        mirror
    }

    pub fn set(&self, text: &str) {
        for var in &self.vars {
            // SAFETY: not fully upheld. Framework code on other runtime
            // threads may call getenv while this runs, and a concurrent
            // read of the environment block is undefined behaviour. Writes
            // happen only after a successful acquisition, and nothing in
            // this crate reads these variables.
            unsafe { std::env::set_var(var, text) };
        }
    }

    pub fn clear(&self) {
        self.set("");
    }
}

impl Default for EnvMirror {
    fn default() -> Self {
        Self::new(DEFAULT_VARS)
    }
}
