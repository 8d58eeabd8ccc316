// SPDX-License-Identifier: MIT
/// Simple geometry for fixed-aspect center crops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AspectRatio {
    pub w: u32,
    pub h: u32,
}

impl AspectRatio {
    /// The 4:3 frame used by the capture and gallery pickers.
    pub const FOUR_THREE: AspectRatio = AspectRatio { w: 4, h: 3 };

    pub fn new(w: u32, h: u32) -> Option<Self> {
        (w > 0 && h > 0).then_some(Self { w, h })
    }
}

/// Sub-rectangle of the source image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Largest centered rectangle of `aspect` that fits inside `w`×`h`.
///
/// Inputs already at the right ratio come back untouched. Degenerate inputs
/// never produce a zero-sized rectangle.
pub fn plan_center_crop(w: u32, h: u32, aspect: AspectRatio) -> CropRect {
    let (w64, h64) = (w as u64, h as u64);
    let (aw, ah) = (aspect.w.max(1) as u64, aspect.h.max(1) as u64);

    if w64 * ah > h64 * aw {
        // too wide: keep full height
        let cw = ((h64 * aw) / ah).max(1) as u32;
        CropRect { x: (w - cw) / 2, y: 0, w: cw, h: h.max(1) }
    } else {
        // too tall (or exact): keep full width
        let ch = ((w64 * ah) / aw).max(1) as u32;
        CropRect { x: 0, y: (h.saturating_sub(ch)) / 2, w: w.max(1), h: ch }
    }
}
