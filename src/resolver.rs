//! Country resolution against the yield model's training set.
//!
//! The regression model only knows the countries it was trained on, so a
//! user-supplied name is resolved in strict priority order: exact match in
//! the training set, then a curated climate proxy, then the default area.
//! Resolution never fails — unknown input degrades to a substitute rather
//! than blocking the request — and every substitution is reported back in
//! the [`CountryResolution`] provenance.

use crate::types::CountryResolution;

// ---------------------------------------------------------------------------
// Training-set countries
// ---------------------------------------------------------------------------

/// Countries present in the model's training data. Matching is exact and
/// case-sensitive: these are the literal `Area` values the model expects.
pub const KNOWN_AREAS: &[&str] = &[
    "Albania",
    "Algeria",
    "Argentina",
    "Armenia",
    "Australia",
    "Austria",
    "Azerbaijan",
    "Bahamas",
    "Bangladesh",
    "Belarus",
    "Belgium",
    "Botswana",
    "Brazil",
    "Bulgaria",
    "Burkina Faso",
    "Burundi",
    "Cameroon",
    "Canada",
    "Central African Republic",
    "Chile",
    "Colombia",
    "Croatia",
    "Denmark",
    "Dominican Republic",
    "Ecuador",
    "Egypt",
    "El Salvador",
    "Eritrea",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Ghana",
    "Greece",
    "Guatemala",
    "Guinea",
    "Guyana",
    "Haiti",
    "Honduras",
    "Hungary",
    "India",
    "Indonesia",
    "Iraq",
    "Ireland",
    "Italy",
    "Jamaica",
    "Japan",
    "Kazakhstan",
    "Kenya",
    "Latvia",
    "Lebanon",
    "Lesotho",
    "Libya",
    "Lithuania",
    "Madagascar",
    "Malawi",
    "Malaysia",
    "Mali",
    "Mauritania",
    "Mauritius",
    "Mexico",
    "Morocco",
    "Mozambique",
    "Namibia",
    "Nepal",
    "Netherlands",
    "New Zealand",
    "Nicaragua",
    "Niger",
    "Norway",
    "Pakistan",
    "Papua New Guinea",
    "Peru",
    "Poland",
    "Portugal",
    "Qatar",
    "Romania",
    "Rwanda",
    "Saudi Arabia",
    "Senegal",
    "Slovenia",
    "South Africa",
    "Spain",
    "Sri Lanka",
    "Sudan",
    "Suriname",
    "Sweden",
    "Switzerland",
    "Tajikistan",
    "Thailand",
    "Tunisia",
    "Turkey",
    "Uganda",
    "Ukraine",
    "United Kingdom",
    "Uruguay",
    "Zambia",
    "Zimbabwe",
];

// ---------------------------------------------------------------------------
// Curated proxies
// ---------------------------------------------------------------------------

/// Substitutes for countries missing from the training set, each paired
/// with a climatically/geographically similar trained country. Keys are
/// never members of [`KNOWN_AREAS`] (such entries would be unreachable
/// behind the exact-match rule); every value is.
pub const PROXY_AREAS: &[(&str, &str)] = &[
    // Gulf of Guinea coast
    ("Nigeria", "Ghana"),
    ("Ivory Coast", "Ghana"),
    ("Benin", "Ghana"),
    ("Togo", "Ghana"),
    // Sahel
    ("Chad", "Niger"),
    // Atlantic West Africa
    ("Sierra Leone", "Guinea"),
    ("Liberia", "Guinea"),
    ("Guinea-Bissau", "Guinea"),
    ("Gambia", "Senegal"),
    ("Cape Verde", "Senegal"),
    // Horn of Africa and East Africa
    ("Ethiopia", "Kenya"),
    ("Tanzania", "Kenya"),
    ("Somalia", "Kenya"),
    ("Djibouti", "Eritrea"),
    // Central Africa
    ("Congo", "Cameroon"),
    ("Equatorial Guinea", "Cameroon"),
    ("Gabon", "Cameroon"),
    // Indian Ocean islands
    ("Comoros", "Madagascar"),
    ("Seychelles", "Mauritius"),
    // Southern Africa
    ("Angola", "Zambia"),
    ("Swaziland", "South Africa"),
];

/// Area used when a name matches neither table. Ghana stands in for the
/// service's primary West African market, which is itself absent from the
/// training set.
pub const DEFAULT_AREA: &str = "Ghana";

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Whether the model was trained on this exact name.
pub fn is_known(name: &str) -> bool {
    KNOWN_AREAS.contains(&name)
}

/// The curated proxy for an untrained country, if one exists.
pub fn proxy_for(name: &str) -> Option<&'static str> {
    PROXY_AREAS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

/// Resolve a raw country name to a trained area, first match wins:
/// exact training-set hit, then curated proxy, then [`DEFAULT_AREA`].
pub fn resolve(input: &str) -> CountryResolution {
    if is_known(input) {
        return CountryResolution {
            area: input.to_string(),
            original: input.to_string(),
            fallback_used: None,
        };
    }

    let area = proxy_for(input).unwrap_or(DEFAULT_AREA);
    CountryResolution {
        area: area.to_string(),
        original: input.to_string(),
        fallback_used: Some(area.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
