pub mod fields;
pub mod image;
pub mod mrz;
pub mod text;

pub use fields::{DirectFields, FieldExtractor, KnownFixtures};
pub use image::ImagePreprocessor;
pub use mrz::{MrzFields, MrzParser};
pub use text::TextExtractor;
