//! ISO 3166-1 country code conversion

use isocountry::CountryCode;

/// Converts an alpha-2 country code ("us", " GB ") to its alpha-3 form.
///
/// Returns `None` for anything that is not an assigned alpha-2 code.
pub fn alpha2_to_alpha3(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_uppercase();
    CountryCode::for_alpha2(&code)
        .ok()
        .map(|country| country.alpha3())
}
