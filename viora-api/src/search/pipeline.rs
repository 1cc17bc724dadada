use bson::{doc, Document};

use crate::search::{GeoQuery, PageRequest, SortSpec};

/// Assembles the aggregation for a geo-constrained salon search. Stage order
/// is load-bearing: `$geoNear` must be the first stage of the pipeline and
/// also applies the radius cut, the `$facet` at the end pages items and counts
/// the total in one round trip.
pub fn geo_salon_pipeline(
    geo: &GeoQuery,
    filter: &Document,
    sort: &SortSpec,
    page: &PageRequest,
) -> Vec<Document> {
    let mut stages = Vec::with_capacity(9);
    stages.push(geo_near_stage(geo));
    if !filter.is_empty() {
        stages.push(doc! { "$match": filter.clone() });
    }
    stages.extend(location_lookup_stages());
    stages.push(projection_stage());
    stages.push(doc! { "$sort": sort.to_document() });
    stages.push(facet_stage(page));
    stages
}

fn geo_near_stage(geo: &GeoQuery) -> Document {
    doc! {
        "$geoNear": {
            "near": { "type": "Point", "coordinates": [geo.lng, geo.lat] },
            "distanceField": "distance",
            "maxDistance": geo.radius_m,
            "spherical": true,
        }
    }
}

/// Joins the area, then the city through the area. Both are optional on a
/// salon so the unwinds must preserve empty results.
fn location_lookup_stages() -> Vec<Document> {
    vec![
        doc! { "$lookup": {
            "from": "areas",
            "localField": "areaId",
            "foreignField": "_id",
            "as": "area",
        } },
        doc! { "$unwind": { "path": "$area", "preserveNullAndEmptyArrays": true } },
        doc! { "$lookup": {
            "from": "cities",
            "localField": "area.cityId",
            "foreignField": "_id",
            "as": "city",
        } },
        doc! { "$unwind": { "path": "$city", "preserveNullAndEmptyArrays": true } },
    ]
}

fn projection_stage() -> Document {
    doc! { "$project": {
        "name": 1,
        "slug": 1,
        "description": 1,
        "address": 1,
        "location": 1,
        "mode": 1,
        "audience": 1,
        "gallery": 1,
        "priceLevel": 1,
        "averageRating": 1,
        "ratingCount": 1,
        "popularityScore": 1,
        "isVerified": 1,
        "areaName": "$area.name",
        "cityName": "$city.name",
        "distance": { "$round": ["$distance", 0] },
    } }
}

fn facet_stage(page: &PageRequest) -> Document {
    doc! { "$facet": {
        "items": [
            { "$skip": page.skip() as i64 },
            { "$limit": page.limit },
        ],
        "total": [ { "$count": "count" } ],
    } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{resolve_sort, SearchEntity};

    fn geo() -> GeoQuery {
        GeoQuery {
            lat: 25.2048,
            lng: 55.2708,
            radius_m: 5_000.0,
        }
    }

    fn page() -> PageRequest {
        PageRequest { page: 2, limit: 20 }
    }

    fn sort() -> SortSpec {
        resolve_sort(None, None, SearchEntity::Salon, true).unwrap()
    }

    #[test]
    fn geo_near_is_always_the_first_stage() {
        let pipeline = geo_salon_pipeline(&geo(), &doc! { "isActive": true }, &sort(), &page());
        let first = pipeline.first().unwrap();
        assert!(first.contains_key("$geoNear"));

        let near = first.get_document("$geoNear").unwrap();
        assert_eq!(near.get_f64("maxDistance").unwrap(), 5_000.0);
        assert_eq!(near.get_str("distanceField").unwrap(), "distance");
        let coordinates = near
            .get_document("near")
            .unwrap()
            .get_array("coordinates")
            .unwrap();
        assert_eq!(coordinates[0].as_f64().unwrap(), 55.2708);
        assert_eq!(coordinates[1].as_f64().unwrap(), 25.2048);
    }

    #[test]
    fn match_follows_geo_near_when_filters_exist() {
        let pipeline = geo_salon_pipeline(&geo(), &doc! { "isActive": true }, &sort(), &page());
        assert!(pipeline[1].contains_key("$match"));
    }

    #[test]
    fn empty_filter_emits_no_match_stage() {
        let pipeline = geo_salon_pipeline(&geo(), &Document::new(), &sort(), &page());
        assert!(!pipeline.iter().any(|stage| stage.contains_key("$match")));
    }

    #[test]
    fn sort_comes_after_projection_and_before_facet() {
        let pipeline = geo_salon_pipeline(&geo(), &doc! { "isActive": true }, &sort(), &page());
        let position = |key: &str| {
            pipeline
                .iter()
                .position(|stage| stage.contains_key(key))
                .unwrap()
        };
        assert!(position("$project") < position("$sort"));
        assert!(position("$sort") < position("$facet"));
        assert_eq!(position("$facet"), pipeline.len() - 1);
    }

    #[test]
    fn facet_pages_items_and_counts_total() {
        let pipeline = geo_salon_pipeline(&geo(), &Document::new(), &sort(), &page());
        let facet = pipeline.last().unwrap().get_document("$facet").unwrap();

        let items = facet.get_array("items").unwrap();
        let skip = items[0].as_document().unwrap();
        let limit = items[1].as_document().unwrap();
        assert_eq!(skip.get_i64("$skip").unwrap(), 20);
        assert_eq!(limit.get_i64("$limit").unwrap(), 20);

        let total = facet.get_array("total").unwrap();
        assert_eq!(
            total[0].as_document().unwrap().get_str("$count").unwrap(),
            "count"
        );
    }

    #[test]
    fn distance_is_rounded_in_the_projection() {
        let pipeline = geo_salon_pipeline(&geo(), &Document::new(), &sort(), &page());
        let project = pipeline
            .iter()
            .find(|stage| stage.contains_key("$project"))
            .unwrap()
            .get_document("$project")
            .unwrap();
        let round = project.get_document("distance").unwrap();
        assert!(round.contains_key("$round"));
    }

    #[test]
    fn lookups_preserve_salons_without_area() {
        let pipeline = geo_salon_pipeline(&geo(), &Document::new(), &sort(), &page());
        let unwinds: Vec<&Document> = pipeline
            .iter()
            .filter_map(|stage| stage.get_document("$unwind").ok())
            .collect();
        assert_eq!(unwinds.len(), 2);
        for unwind in unwinds {
            assert!(unwind.get_bool("preserveNullAndEmptyArrays").unwrap());
        }
    }

    #[test]
    fn full_query_assembles_the_documented_pipeline() {
        use crate::domain::{Audience, ServiceMode};
        use crate::search::SalonFilter;

        let filter = SalonFilter {
            mode: Some(ServiceMode::ToHome),
            audience: Some(Audience::Women),
            ..Default::default()
        }
        .to_document();
        let geo = GeoQuery {
            lat: 25.2048,
            lng: 55.2708,
            radius_m: 8_000.0,
        };
        let page = PageRequest { page: 1, limit: 10 };
        let sort = resolve_sort(None, None, SearchEntity::Salon, true).unwrap();

        let pipeline = geo_salon_pipeline(&geo, &filter, &sort, &page);

        let keys: Vec<&str> = pipeline
            .iter()
            .map(|stage| stage.keys().next().unwrap().as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "$geoNear", "$match", "$lookup", "$unwind", "$lookup", "$unwind", "$project",
                "$sort", "$facet",
            ]
        );

        let near = pipeline[0].get_document("$geoNear").unwrap();
        assert_eq!(near.get_f64("maxDistance").unwrap(), 8_000.0);

        let predicate = pipeline[1].get_document("$match").unwrap();
        assert_eq!(
            predicate,
            &doc! {
                "isActive": true,
                "mode": { "$in": ["toHome", "both"] },
                "audience": { "$in": ["women", "unisex"] },
            }
        );

        let sort_doc = pipeline[7].get_document("$sort").unwrap();
        assert_eq!(sort_doc.get_i32("distance").unwrap(), 1);
    }
}
