//! Archive extraction

mod zip;

pub use self::zip::ZipExtractor;
