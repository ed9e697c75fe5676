//! Declarative menu registry.
//!
//! The original design passed opaque template codes around as magic strings.
//! Here each menu is a named id with a declared option vocabulary; the
//! registry is validated once at startup so a menu whose tokens do not parse
//! into commands or conversion targets fails boot instead of failing a user
//! mid-flow. The mapping from `MenuId` to a transport template identifier
//! lives in the Twilio adapter's configuration.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::media::{ConversionTarget, MediaKind};

/// Identifier of an interactive menu the transport can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuId {
    /// Top-level capabilities menu.
    Generic,
    /// Actions on a named pending file (upload/convert/ai).
    FileActions,
    /// Entry point back into the retrieve flow.
    Retrieve,
    /// PDF conversion options.
    Pdf,
    /// DOCX conversion options.
    Docx,
    /// Image conversion options.
    Image,
}

impl MenuId {
    /// The conversion-source kind this menu selects targets for, if any.
    pub fn conversion_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Pdf => Some(MediaKind::Pdf),
            Self::Docx => Some(MediaKind::Docx),
            Self::Image => Some(MediaKind::Image),
            _ => None,
        }
    }

    /// Menu for a given conversion-source kind.
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Pdf => Self::Pdf,
            MediaKind::Docx => Self::Docx,
            MediaKind::Image => Self::Image,
        }
    }
}

impl fmt::Display for MenuId {
    // Matches the snake_case serde names so log lines and config keys agree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MenuId::Generic => "generic",
            MenuId::FileActions => "file_actions",
            MenuId::Retrieve => "retrieve",
            MenuId::Pdf => "pdf",
            MenuId::Docx => "docx",
            MenuId::Image => "image",
        };
        write!(f, "{name}")
    }
}

/// A menu registry invalid at startup.
#[derive(Debug, thiserror::Error)]
pub enum MenuConfigError {
    #[error("menu {menu} option '{token}' does not parse to any action")]
    UnparsableOption { menu: MenuId, token: &'static str },

    #[error("menu {menu} declares duplicate option '{token}'")]
    DuplicateOption { menu: MenuId, token: &'static str },
}

/// Registry of every menu and its option vocabulary.
#[derive(Debug)]
pub struct MenuRegistry {
    entries: Vec<(MenuId, &'static [&'static str])>,
}

/// Process-wide menu registry; validated once during startup.
pub static MENUS: Lazy<MenuRegistry> = Lazy::new(MenuRegistry::standard);

impl MenuRegistry {
    /// Builds the standard registry matching the interaction design.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (MenuId::Generic, &["retrieve", "manage"]),
                (MenuId::FileActions, &["upload", "retrieve", "convert", "ai"]),
                (MenuId::Retrieve, &["retrieve"]),
                (MenuId::Pdf, &["word", "text"]),
                (MenuId::Docx, &["pdf", "text", "html", "markdown"]),
                (
                    MenuId::Image,
                    &["jpg", "jpeg", "png", "webp", "compress", "black&white"],
                ),
            ],
        }
    }

    /// Option tokens of a menu.
    pub fn options(&self, menu: MenuId) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(id, _)| *id == menu)
            .map(|(_, opts)| *opts)
            .unwrap_or(&[])
    }

    /// Validates every declared option: conversion-menu tokens must parse to
    /// a `ConversionTarget` of the menu's kind, and no menu may declare the
    /// same token twice.
    pub fn validate(&self) -> Result<(), MenuConfigError> {
        for (menu, options) in &self.entries {
            let mut seen = HashSet::new();
            for token in *options {
                if !seen.insert(*token) {
                    return Err(MenuConfigError::DuplicateOption { menu: *menu, token });
                }
                if let Some(kind) = menu.conversion_kind() {
                    if ConversionTarget::parse(kind, token).is_none() {
                        return Err(MenuConfigError::UnparsableOption { menu: *menu, token });
                    }
                }
            }
        }
        Ok(())
    }
}
