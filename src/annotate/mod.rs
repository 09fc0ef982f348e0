//! Result fusion and overlay composition.

mod compositor;
mod font;
mod fusion;
mod shapes;

pub use compositor::{Compositor, Watermark, label_text};
pub use font::LabelFont;
pub use fusion::{Annotation, BreedMatch, match_breed, plan_annotations};
pub use shapes::{RoundedRect, fill_rounded_rect, stroke_rounded_rect};
