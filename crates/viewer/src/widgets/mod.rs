//! Page widgets that sit next to the viewers: slide carousel and
//! before/after comparison slider. Each instance owns its drag state.

mod carousel;
mod compare;

pub use carousel::{Carousel, CarouselOptions, SWIPE_THRESHOLD};
pub use compare::CompareSlider;
