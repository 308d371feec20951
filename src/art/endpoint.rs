/// Public Cover Art Archive host.
pub const DEFAULT_API_URL: &str = "http://coverartarchive.org";

/// URL of the front cover of a release.
///
/// The album id is interpolated as given; malformed ids simply produce a
/// not-found response from the archive.
pub fn front_cover_url(api_url: &str, album_id: &str) -> String {
    format!(
        "{}/release/{}/front",
        api_url.trim_end_matches('/'),
        album_id
    )
}
