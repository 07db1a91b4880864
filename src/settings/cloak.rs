//! Tab cloaking: the disguised title and icon shown for the hosting
//! document.
//!
//! Changing the profile doesn't touch the document by itself. Callers run
//! [`apply`] against a [`DocumentChrome`] after a successful update.

use std::io::{self, Write};
use std::rc::Rc;

use crossterm::{execute, terminal::SetTitle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{CLOAK_KEY, DEFAULT_CLOAK_ICON, DEFAULT_CLOAK_TITLE};
use crate::store::{KvStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloakProfile {
    pub title: String,
    pub icon_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl Default for CloakProfile {
    fn default() -> Self {
        Self {
            title: DEFAULT_CLOAK_TITLE.to_string(),
            icon_type: DEFAULT_CLOAK_ICON.to_string(),
            custom_icon_url: None,
            favicon: None,
            custom_css: None,
        }
    }
}

impl CloakProfile {
    /// Icon to show: an explicit custom URL beats the preset favicon.
    pub fn icon_href(&self) -> Option<&str> {
        self.custom_icon_url
            .as_deref()
            .or(self.favicon.as_deref())
    }
}

// ── Presets ───────────────────────────────────────────────────────

/// A named, ready-made disguise.
#[derive(Debug, Clone, Copy)]
pub struct CloakPreset {
    pub name: &'static str,
    pub title: &'static str,
    pub icon_type: &'static str,
    pub favicon: Option<&'static str>,
}

impl CloakPreset {
    pub fn profile(&self) -> CloakProfile {
        CloakProfile {
            title: self.title.to_string(),
            icon_type: self.icon_type.to_string(),
            custom_icon_url: None,
            favicon: self.favicon.map(str::to_string),
            custom_css: None,
        }
    }
}

pub const PRESETS: &[CloakPreset] = &[
    CloakPreset {
        name: "default",
        title: DEFAULT_CLOAK_TITLE,
        icon_type: DEFAULT_CLOAK_ICON,
        favicon: None,
    },
    CloakPreset {
        name: "google-classroom",
        title: "Home - Classroom",
        icon_type: "classroom",
        favicon: Some("https://ssl.gstatic.com/classroom/favicon.png"),
    },
    CloakPreset {
        name: "google-docs",
        title: "Google Docs",
        icon_type: "docs",
        favicon: Some("https://ssl.gstatic.com/docs/documents/images/kix-favicon7.ico"),
    },
    CloakPreset {
        name: "google-drive",
        title: "My Drive - Google Drive",
        icon_type: "drive",
        favicon: Some("https://ssl.gstatic.com/images/branding/product/1x/drive_2020q4_32dp.png"),
    },
    CloakPreset {
        name: "canvas",
        title: "Dashboard",
        icon_type: "canvas",
        favicon: Some("https://du11hjcvx0uqb.cloudfront.net/dist/images/favicon-e10d657a73.ico"),
    },
    CloakPreset {
        name: "khan-academy",
        title: "Dashboard | Khan Academy",
        icon_type: "khan",
        favicon: Some("https://www.khanacademy.org/favicon.ico"),
    },
];

/// Look up a preset by name (case-insensitive).
pub fn preset(name: &str) -> Option<&'static CloakPreset> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

// ── Document chrome ───────────────────────────────────────────────

/// The visible title/icon surface of whatever hosts the front end.
pub trait DocumentChrome {
    fn set_title(&mut self, title: &str) -> io::Result<()>;
    fn set_icon(&mut self, href: &str) -> io::Result<()>;
}

/// Push `profile` onto `chrome`.
pub fn apply(profile: &CloakProfile, chrome: &mut dyn DocumentChrome) -> io::Result<()> {
    chrome.set_title(&profile.title)?;
    if let Some(href) = profile.icon_href() {
        chrome.set_icon(href)?;
    }
    debug!(title = %profile.title, "applied cloak profile");
    Ok(())
}

/// Terminal window chrome. Terminals have a title but no favicon, so icons
/// are only logged.
pub struct TerminalChrome<W: Write> {
    out: W,
}

impl<W: Write> TerminalChrome<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> DocumentChrome for TerminalChrome<W> {
    fn set_title(&mut self, title: &str) -> io::Result<()> {
        execute!(self.out, SetTitle(title))
    }

    fn set_icon(&mut self, href: &str) -> io::Result<()> {
        debug!(href, "terminal has no icon slot, skipping");
        Ok(())
    }
}

// ── CloakStore ────────────────────────────────────────────────────

pub struct CloakStore {
    kv: Rc<KvStore>,
}

impl CloakStore {
    pub fn new(kv: Rc<KvStore>) -> Self {
        Self { kv }
    }

    pub fn get(&self) -> CloakProfile {
        self.kv.load(CLOAK_KEY).unwrap_or_default()
    }

    /// Persist `profile`. Returns whether the title changed, in which case
    /// the caller should re-[`apply`] it.
    pub fn replace(&mut self, profile: &CloakProfile) -> Result<bool, StoreError> {
        let title_changed = self.get().title != profile.title;
        self.kv.save(CLOAK_KEY, profile)?;
        Ok(title_changed)
    }

    pub fn reset(&mut self) -> Result<(), StoreError> {
        info!("resetting cloak profile");
        self.kv.save(CLOAK_KEY, &CloakProfile::default())
    }
}
