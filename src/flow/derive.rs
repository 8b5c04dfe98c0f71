//! Category-specific answer derivation.
//!
//! Pure, synchronous functions dispatched on the question category. A
//! failed parse is never an error; the raw answer is stored unmodified and
//! the derived fields are simply absent.

use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Structured components parsed out of an address answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    /// Street line, including the house number.
    pub street: String,
    /// City or locality.
    pub city: String,
    /// State, province, or region.
    pub region: Option<String>,
    /// Postal or ZIP code.
    pub postal_code: Option<String>,
    /// Country, when given.
    pub country: Option<String>,
}

/// Auxiliary data derived from a committed answer, keyed by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Derivation {
    /// An address answer parsed into components plus a generated default
    /// display label for the home.
    Address {
        components: AddressComponents,
        display_name: String,
    },
}

impl Derivation {
    /// The generated display label, when this derivation carries one
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Derivation::Address { display_name, .. } => Some(display_name),
        }
    }
}

/// Derive auxiliary data for an answer in the given category. Returns
/// `None` for categories with no derivation rule or when parsing fails.
pub fn for_category(category: Category, answer: &str) -> Option<Derivation> {
    match category {
        Category::HouseInfo => parse_address(answer).map(|components| {
            let display_name = default_label(&components.street);
            Derivation::Address {
                components,
                display_name,
            }
        }),
        _ => None,
    }
}

/// Parse a comma-separated address: street, city[, region postal][, country].
/// Needs at least a street and a city to succeed.
fn parse_address(raw: &str) -> Option<AddressComponents> {
    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() < 2 {
        return None;
    }

    let street = segments[0].to_string();
    let city = segments[1].to_string();

    let (region, postal_code) = match segments.get(2) {
        Some(segment) => split_region_postal(segment),
        None => (None, None),
    };
    let country = segments.get(3).map(|s| s.to_string());

    Some(AddressComponents {
        street,
        city,
        region,
        postal_code,
        country,
    })
}

/// Split "OR 97201" style segments into region and postal code. A trailing
/// token containing a digit is taken as the postal code.
fn split_region_postal(segment: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    if tokens.is_empty() {
        return (None, None);
    }

    let last_is_postal = tokens
        .last()
        .map(|t| t.chars().any(|c| c.is_ascii_digit()))
        .unwrap_or(false);

    if last_is_postal {
        let postal = tokens[tokens.len() - 1].to_string();
        let region = if tokens.len() > 1 {
            Some(tokens[..tokens.len() - 1].join(" "))
        } else {
            None
        };
        (region, Some(postal))
    } else {
        (Some(tokens.join(" ")), None)
    }
}

/// Default home label from a street line: the street name without its house
/// number, falling back to the whole line.
fn default_label(street: &str) -> String {
    let name: Vec<&str> = street
        .split_whitespace()
        .filter(|token| !token.chars().any(|c| c.is_ascii_digit()))
        .collect();

    if name.is_empty() {
        street.to_string()
    } else {
        name.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_address_parses() {
        let derived =
            for_category(Category::HouseInfo, "12 Elm Street, Portland, OR 97201, USA").unwrap();

        let Derivation::Address {
            components,
            display_name,
        } = derived;

        assert_eq!(components.street, "12 Elm Street");
        assert_eq!(components.city, "Portland");
        assert_eq!(components.region.as_deref(), Some("OR"));
        assert_eq!(components.postal_code.as_deref(), Some("97201"));
        assert_eq!(components.country.as_deref(), Some("USA"));
        assert_eq!(display_name, "Elm Street");
    }

    #[test]
    fn test_street_and_city_only() {
        let derived = for_category(Category::HouseInfo, "4 Privet Drive, Little Whinging").unwrap();
        let Derivation::Address { components, .. } = derived;
        assert_eq!(components.street, "4 Privet Drive");
        assert_eq!(components.city, "Little Whinging");
        assert!(components.region.is_none());
        assert!(components.postal_code.is_none());
        assert!(components.country.is_none());
    }

    #[test]
    fn test_region_without_postal() {
        let derived = for_category(Category::HouseInfo, "1 Harbour Way, Wellington, Te Aro").unwrap();
        let Derivation::Address { components, .. } = derived;
        assert_eq!(components.region.as_deref(), Some("Te Aro"));
        assert!(components.postal_code.is_none());
    }

    #[test]
    fn test_street_only_fails_nonfatally() {
        assert!(for_category(Category::HouseInfo, "just a street").is_none());
        assert!(for_category(Category::HouseInfo, "").is_none());
        assert!(for_category(Category::HouseInfo, " , , ").is_none());
    }

    #[test]
    fn test_other_categories_have_no_derivation() {
        assert!(for_category(Category::Personal, "Alex").is_none());
        assert!(for_category(Category::Preferences, "Celsius").is_none());
        assert!(for_category(Category::Other, "12 Elm Street, Portland").is_none());
    }

    #[test]
    fn test_default_label_strips_house_number() {
        assert_eq!(default_label("12 Elm Street"), "Elm Street");
        assert_eq!(default_label("Elm Street"), "Elm Street");
        // Everything numeric falls back to the full line
        assert_eq!(default_label("221B"), "221B");
    }
}
