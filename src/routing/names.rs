//! Fixed route names.
//!
//! Names are matched exactly and case-sensitively, without a leading slash.

pub const FAVICON: &str = "favicon.ico";
pub const MAIN: &str = "main";
pub const LOGIN: &str = "sys/login";
pub const REGISTER: &str = "sys/register";
pub const PROCESS_LOGIN: &str = "sys/process-login";
pub const PROCESS_REGISTER: &str = "sys/process-register";
pub const PAGEREQ: &str = "sys/pagereq";

pub const FONTS: &str = "sys/fonts";
pub const IMAGES: &str = "sys/images";

/// Parameter carrying the slug of a page route.
pub const PAGE_ID_PARAM: &str = "pageid";

/// Route name of a font asset.
pub fn font(name: &str) -> String {
    format!("{}/{}", FONTS, name)
}

/// Route name of an image asset.
pub fn image(name: &str) -> String {
    format!("{}/{}", IMAGES, name)
}

/// Canonical form of a registered name (no leading slash).
pub fn normalize(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}
