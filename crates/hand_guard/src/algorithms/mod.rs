pub mod segmentation;
pub mod morphology;
pub mod extraction;
pub mod hull;
pub mod proximity;

pub use segmentation::*;
pub use morphology::*;
pub use extraction::*;
pub use hull::*;
pub use proximity::*;
