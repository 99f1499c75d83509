//! URL handling module for Image-Harvester
//!
//! This module provides href resolution for discovered links, resolution of
//! harvested image sources, and the on-disk file name derived from an image URL.

mod filename;
mod resolve;

// Re-export main functions
pub use filename::file_name_for;
pub use resolve::{resolve_href, resolve_image_src};

/// How hrefs that do not resolve to an HTTP(S) URL are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Drop anything that does not resolve to an `http`/`https` URL
    #[default]
    Strict,

    /// Glue the base URL onto the resolved value minus its first character.
    ///
    /// This is the historical behaviour of the tool and can construct malformed
    /// URLs such as `https://example.com/ailto:someone@example.com`.
    LegacyRepair,
}

impl LinkPolicy {
    /// Picks the policy from the `legacy-url-repair` switch
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            Self::LegacyRepair
        } else {
            Self::Strict
        }
    }
}
