use crate::{UrlError, UrlResult};
use url::Url;

/// Derives the on-disk file name for an image URL
///
/// The name is the final segment of the URL path, exactly as it appears in the
/// URL. Query strings and fragments are ignored, so two URLs differing only in
/// their query map to the same file.
///
/// # Examples
///
/// ```
/// use image_harvester::url::file_name_for;
/// use url::Url;
///
/// let url = Url::parse("https://cdn.example.com/photos/2024/photo.jpg?w=800").unwrap();
/// assert_eq!(file_name_for(&url).unwrap(), "photo.jpg");
/// ```
pub fn file_name_for(url: &Url) -> UrlResult<String> {
    let segment = url.path().rsplit('/').next().unwrap_or_default();

    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(UrlError::NoFilename(url.to_string()));
    }

    Ok(segment.to_string())
}
