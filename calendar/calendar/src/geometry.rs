//! Normalized placement value types.
//!
//! Frames and crops are expressed in the unit square of their parent (page or source image), so they survive
//! changes of page format and orientation.  Margins are physical lengths in millimeters.

use std::fmt::Display;

/// The smallest width or height a committed frame may have.
pub const MIN_FRAME_EXTENT: f64 = 0.01;

/// Images may not be scaled down below this factor.
pub const MIN_IMAGE_SCALE: f64 = 0.5;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub lock_aspect: bool,
}

impl Frame {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            lock_aspect: false,
        }
    }

    pub const fn with_lock_aspect(self, lock_aspect: bool) -> Self {
        Self {
            lock_aspect,
            ..self
        }
    }

    /// A frame is valid when it has a positive, finite size.
    ///
    /// The position may be outside the page while a frame is being dragged, see [`Frame::clamped`].
    pub fn is_valid(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }

    /// Constrain the frame to the unit square, ready to be committed to a page.
    ///
    /// The size is clamped to `[MIN_FRAME_EXTENT, 1]` first, then the position is moved so that the whole frame
    /// is on the page.  A frame with a locked aspect ratio is scaled as a whole.
    pub fn clamped(&self) -> Self {
        let (w, h) = self.clamped_size();

        Self {
            x: clamp_position(self.x, w),
            y: clamp_position(self.y, h),
            w,
            h,
            lock_aspect: self.lock_aspect,
        }
    }
}

impl Frame {
    fn clamped_size(&self) -> (f64, f64) {
        if self.lock_aspect && self.is_valid() {
            let largest = self.w.max(self.h);
            let smallest = self.w.min(self.h);
            if largest > 1.0 {
                return (clamp_extent(self.w / largest), clamp_extent(self.h / largest));
            }
            if smallest < MIN_FRAME_EXTENT {
                let factor = MIN_FRAME_EXTENT / smallest;
                return (clamp_extent(self.w * factor), clamp_extent(self.h * factor));
            }
        }

        (clamp_extent(self.w), clamp_extent(self.h))
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x: {}, y: {}, w: {}, h: {}", self.x, self.y, self.w, self.h)
    }
}

fn clamp_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_FRAME_EXTENT, 1.0)
    } else {
        1.0
    }
}

fn clamp_position(value: f64, extent: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0 - extent)
    } else {
        0.0
    }
}

/// A sub-rectangle of the source image, in the unit square of the image.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CropRect {
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub fn clamped(&self) -> Self {
        let w = clamp_extent(self.w);
        let h = clamp_extent(self.h);

        Self {
            x: clamp_position(self.x, w),
            y: clamp_position(self.y, h),
            w,
            h,
        }
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Pan, scale, rotation and crop of an image within its frame.
///
/// `x` and `y` are pan offsets relative to the frame size, `rotation` is in degrees.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
    #[serde(default)]
    pub crop: CropRect,
}

pub const DEFAULT_IMAGE_TRANSFORM: ImageTransform = ImageTransform {
    x: 0.0,
    y: 0.0,
    scale: 1.0,
    rotation: 0.0,
    crop: CropRect::FULL,
};

impl ImageTransform {
    /// Returns a copy with the scale floored at [`MIN_IMAGE_SCALE`], the rotation in `[-180, 180]` and the crop
    /// inside the image.
    pub fn normalized(&self) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.max(MIN_IMAGE_SCALE)
        } else {
            1.0
        };

        Self {
            x: finite_or_zero(self.x),
            y: finite_or_zero(self.y),
            scale,
            rotation: normalize_rotation(self.rotation),
            crop: self.crop.clamped(),
        }
    }
}

impl Default for ImageTransform {
    fn default() -> Self {
        DEFAULT_IMAGE_TRANSFORM
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Normalize an angle in degrees to `[-180, 180]`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let remainder = degrees % 360.0;
    if remainder > 180.0 {
        remainder - 360.0
    } else if remainder < -180.0 {
        remainder + 360.0
    } else {
        remainder
    }
}

/// Page margins, in millimeters.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const DEFAULT_MARGINS: PageMargins = PageMargins::uniform(10.0);

impl PageMargins {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Negative and non-finite values become zero.
    ///
    /// The engine stores margins as given, callers are expected to clamp user input with this first.
    pub fn clamped(&self) -> Self {
        let clamp = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };

        Self {
            top: clamp(self.top),
            right: clamp(self.right),
            bottom: clamp(self.bottom),
            left: clamp(self.left),
        }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        DEFAULT_MARGINS
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Image,
    Grid,
}

impl Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameType::Image => f.write_str("image"),
            FrameType::Grid => f.write_str("grid"),
        }
    }
}
