use bson::Document;
use strum::EnumString;
use thiserror::Error;

/// Sort keys a client may ask for. Unknown strings never reach this enum, the
/// parameter layer maps them to `None` and the entity default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortKey {
    Popular,
    Rating,
    Price,
    Name,
    Newest,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Which collection is being sorted. Price lives under a different field on
/// each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEntity {
    Salon,
    Service,
}

#[derive(Debug, Error, PartialEq)]
pub enum SortError {
    #[error("distance sort requires lat and lng")]
    DistanceWithoutGeo,
}

/// Resolved storage-level sort: field name plus 1/-1 direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub direction: i32,
}

impl SortSpec {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(self.field, self.direction);
        doc
    }
}

/// Maps the requested key onto a storage field and fills in defaults: salons
/// order by popularity, services by price, geo searches by distance. The
/// distance key is only meaningful when a geo stage computed one.
pub fn resolve_sort(
    key: Option<SortKey>,
    direction: Option<SortDirection>,
    entity: SearchEntity,
    geo: bool,
) -> Result<SortSpec, SortError> {
    let key = key.unwrap_or(match (geo, entity) {
        (true, _) => SortKey::Distance,
        (false, SearchEntity::Salon) => SortKey::Popular,
        (false, SearchEntity::Service) => SortKey::Price,
    });

    let (field, default_direction) = match key {
        SortKey::Popular => ("popularityScore", SortDirection::Desc),
        SortKey::Rating => ("averageRating", SortDirection::Desc),
        SortKey::Price => match entity {
            SearchEntity::Salon => ("priceLevel", SortDirection::Asc),
            SearchEntity::Service => ("price", SortDirection::Asc),
        },
        SortKey::Name => ("name", SortDirection::Asc),
        SortKey::Newest => ("createdAt", SortDirection::Desc),
        SortKey::Distance => {
            if !geo {
                return Err(SortError::DistanceWithoutGeo);
            }
            ("distance", SortDirection::Asc)
        }
    };

    let direction = match direction.unwrap_or(default_direction) {
        SortDirection::Asc => 1,
        SortDirection::Desc => -1,
    };

    Ok(SortSpec { field, direction })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salons_default_to_popularity_desc() {
        let spec = resolve_sort(None, None, SearchEntity::Salon, false).unwrap();
        assert_eq!(spec.field, "popularityScore");
        assert_eq!(spec.direction, -1);
    }

    #[test]
    fn services_default_to_price_asc() {
        let spec = resolve_sort(None, None, SearchEntity::Service, false).unwrap();
        assert_eq!(spec.field, "price");
        assert_eq!(spec.direction, 1);
    }

    #[test]
    fn geo_searches_default_to_distance_asc() {
        let spec = resolve_sort(None, None, SearchEntity::Salon, true).unwrap();
        assert_eq!(spec.field, "distance");
        assert_eq!(spec.direction, 1);
    }

    #[test]
    fn price_maps_to_price_level_for_salons() {
        let spec = resolve_sort(Some(SortKey::Price), None, SearchEntity::Salon, false).unwrap();
        assert_eq!(spec.field, "priceLevel");
        assert_eq!(spec.direction, 1);
    }

    #[test]
    fn explicit_direction_overrides_default() {
        let spec = resolve_sort(
            Some(SortKey::Rating),
            Some(SortDirection::Asc),
            SearchEntity::Salon,
            false,
        )
        .unwrap();
        assert_eq!(spec.field, "averageRating");
        assert_eq!(spec.direction, 1);
    }

    #[test]
    fn distance_without_geo_is_rejected() {
        let result = resolve_sort(Some(SortKey::Distance), None, SearchEntity::Salon, false);
        assert_eq!(result, Err(SortError::DistanceWithoutGeo));
    }

    #[test]
    fn sort_keys_parse_case_insensitively() {
        assert_eq!("popular".parse::<SortKey>().unwrap(), SortKey::Popular);
        assert_eq!("NEWEST".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert!("trending".parse::<SortKey>().is_err());
    }

    #[test]
    fn spec_renders_a_sort_document() {
        let spec = SortSpec {
            field: "price",
            direction: -1,
        };
        assert_eq!(spec.to_document(), bson::doc! { "price": -1 });
    }
}
