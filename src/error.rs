use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelizerError {
    #[error("Invalid custom palette \"{0}\": expected comma-separated 6-digit hex colors")]
    InvalidPaletteSpec(String),

    #[error("Palette source has no non-transparent pixels")]
    EmptyPaletteSource,

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PixelizerError>;
