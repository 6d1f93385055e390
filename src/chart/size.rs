//! Device-aware figure sizing
//!
//! Mobile clients report their viewport as `<width>x<height>x<density>`
//! (physical pixels plus pixel density). The figure is drawn at
//! `pixels / effective_density`, with density clamped at 2.0 - on
//! very-high-density phones an unclamped division would shrink the figure
//! to illegibility.

use std::str::FromStr;

/// Density values above this are treated as 2.0
pub const MAX_EFFECTIVE_DENSITY: f64 = 2.0;

/// A client viewport: physical pixels and pixel density
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSize {
    pub width_px: u32,
    pub height_px: u32,
    pub density: f64,
}

impl PhysicalSize {
    pub fn new(width_px: u32, height_px: u32, density: f64) -> Self {
        Self {
            width_px,
            height_px,
            density,
        }
    }

    /// Density with the high-DPI clamp applied
    pub fn effective_density(&self) -> f64 {
        if self.density > MAX_EFFECTIVE_DENSITY {
            MAX_EFFECTIVE_DENSITY
        } else {
            self.density
        }
    }

    /// Figure dimensions in drawing pixels
    pub fn figure_px(&self) -> (u32, u32) {
        let density = self.effective_density();
        (
            (self.width_px as f64 / density).round() as u32,
            (self.height_px as f64 / density).round() as u32,
        )
    }
}

impl FromStr for PhysicalSize {
    type Err = String;

    /// Parse the `<width>x<height>x<density>` header format
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 3 {
            return Err(format!("expected WxHxD, got {:?}", s));
        }
        let width_px = parts[0]
            .parse::<u32>()
            .map_err(|e| format!("bad width: {}", e))?;
        let height_px = parts[1]
            .parse::<u32>()
            .map_err(|e| format!("bad height: {}", e))?;
        let density = parts[2]
            .parse::<f64>()
            .map_err(|e| format!("bad density: {}", e))?;
        if width_px == 0 || height_px == 0 || density <= 0.0 {
            return Err(format!("degenerate size: {:?}", s));
        }
        Ok(Self {
            width_px,
            height_px,
            density,
        })
    }
}
