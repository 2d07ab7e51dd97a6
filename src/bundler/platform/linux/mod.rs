//! Linux distribution formats.
//!
//! - [`appimage`] - single-file portable AppImage
//! - [`flatpak`] - sandboxed `.flatpak` bundle
//! - [`desktop`] - freedesktop.org desktop entries shared by both
//! - [`icon`] - PNG icon preparation shared by both

pub mod appimage;
pub mod desktop;
pub mod flatpak;
pub mod icon;
