use std::path::Path;

/// Image container format.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Windows bitmap.
    Bmp,
    /// Truevision TGA.
    Tga,
    /// JPEG (JFIF).
    Jpeg,
    /// PNG. Decode only.
    Png,
}

impl ImageFormat {
    /// Map a file extension (without the dot, any case) to a container.
    pub fn from_extension(ext: &str) -> Option<ImageFormat> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Container implied by a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<ImageFormat> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tga => "tga",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    /// Whether this crate can write the container.
    pub fn can_encode(&self) -> bool {
        !matches!(self, ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(ImageFormat::from_path("a/b/photo.JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path("shot.Jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path("sprite.TGA"), Some(ImageFormat::Tga));
        assert_eq!(ImageFormat::from_path("icon.bmp"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_path("icon.png"), Some(ImageFormat::Png));
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(ImageFormat::from_path("notes.txt"), None);
        assert_eq!(ImageFormat::from_path("bmp"), None);
        assert_eq!(ImageFormat::from_path(".tga"), None);
    }
}
