use bson::{oid::ObjectId, Bson, Document};

use crate::domain::{Audience, ServiceMode};

const SALON_TEXT_FIELDS: &[&str] = &["name", "description", "address", "tags"];
const SERVICE_TEXT_FIELDS: &[&str] = &["name", "description"];

/// Predicate over the salons collection. Every field is optional, absent
/// fields contribute no clause at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalonFilter {
    pub text: Option<String>,
    pub city_id: Option<ObjectId>,
    pub area_id: Option<ObjectId>,
    pub category_id: Option<ObjectId>,
    pub type_id: Option<ObjectId>,
    pub mode: Option<ServiceMode>,
    pub audience: Option<Audience>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub price_level: Option<i32>,
    pub verified: Option<bool>,
    pub include_inactive: bool,
}

impl SalonFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if !self.include_inactive {
            filter.insert("isActive", true);
        }
        if let Some(city_id) = self.city_id {
            filter.insert("cityId", city_id);
        }
        if let Some(area_id) = self.area_id {
            filter.insert("areaId", area_id);
        }
        if let Some(category_id) = self.category_id {
            filter.insert("categories", category_id);
        }
        if let Some(type_id) = self.type_id {
            filter.insert("serviceTypes", type_id);
        }
        if let Some(mode) = self.mode {
            filter.insert("mode", tag_membership(mode.to_string(), ServiceMode::Both.to_string()));
        }
        if let Some(audience) = self.audience {
            filter.insert(
                "audience",
                tag_membership(audience.to_string(), Audience::Unisex.to_string()),
            );
        }
        if let Some(bounds) = range_bounds(self.min_rating, self.max_rating) {
            filter.insert("averageRating", bounds);
        }
        if let Some(price_level) = self.price_level {
            filter.insert("priceLevel", price_level);
        }
        if let Some(verified) = self.verified {
            filter.insert("isVerified", verified);
        }
        if let Some(text) = self.text.as_deref() {
            filter.insert("$or", text_clauses(text, SALON_TEXT_FIELDS));
        }
        filter
    }
}

/// Predicate over the services collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub text: Option<String>,
    pub salon_id: Option<ObjectId>,
    pub category_id: Option<ObjectId>,
    pub type_id: Option<ObjectId>,
    pub mode: Option<ServiceMode>,
    pub audience: Option<Audience>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub include_inactive: bool,
}

impl ServiceFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if !self.include_inactive {
            filter.insert("isActive", true);
        }
        if let Some(salon_id) = self.salon_id {
            filter.insert("salonId", salon_id);
        }
        if let Some(category_id) = self.category_id {
            filter.insert("categoryId", category_id);
        }
        if let Some(type_id) = self.type_id {
            filter.insert("serviceTypeId", type_id);
        }
        if let Some(mode) = self.mode {
            filter.insert("mode", tag_membership(mode.to_string(), ServiceMode::Both.to_string()));
        }
        if let Some(audience) = self.audience {
            filter.insert(
                "audience",
                tag_membership(audience.to_string(), Audience::Unisex.to_string()),
            );
        }
        if let Some(bounds) = range_bounds(self.min_price, self.max_price) {
            filter.insert("price", bounds);
        }
        if let Some(text) = self.text.as_deref() {
            filter.insert("$or", text_clauses(text, SERVICE_TEXT_FIELDS));
        }
        filter
    }
}

/// `{$in: [value, universal]}`: a record matches when it carries the requested
/// tag or the universal one. Asking for the universal tag itself collapses to
/// an equality match.
fn tag_membership(value: String, universal: String) -> Bson {
    if value == universal {
        return Bson::String(value);
    }
    let mut clause = Document::new();
    clause.insert("$in", vec![value, universal]);
    Bson::Document(clause)
}

/// Inclusive bounds document, or nothing when neither end was given. The
/// parameter layer has already rejected inverted ranges.
fn range_bounds<T: Into<Bson> + Copy>(min: Option<T>, max: Option<T>) -> Option<Document> {
    if min.is_none() && max.is_none() {
        return None;
    }
    let mut bounds = Document::new();
    if let Some(min) = min {
        bounds.insert("$gte", min);
    }
    if let Some(max) = max {
        bounds.insert("$lte", max);
    }
    Some(bounds)
}

/// Case-insensitive substring match across `fields`. The needle is escaped so
/// user input never becomes a regex operator.
fn text_clauses(query: &str, fields: &[&str]) -> Vec<Document> {
    let escaped = regex::escape(query.trim());
    fields
        .iter()
        .map(|field| {
            let mut pattern = Document::new();
            pattern.insert("$regex", escaped.clone());
            pattern.insert("$options", "i");
            let mut clause = Document::new();
            clause.insert(*field, pattern);
            clause
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn empty_filter_only_gates_on_active() {
        let filter = SalonFilter::default().to_document();
        assert_eq!(filter, doc! { "isActive": true });
    }

    #[test]
    fn absent_params_contribute_no_clauses() {
        let filter = SalonFilter {
            min_rating: Some(4.0),
            ..Default::default()
        }
        .to_document();
        assert_eq!(
            filter,
            doc! { "isActive": true, "averageRating": { "$gte": 4.0 } }
        );
        assert!(!filter.contains_key("mode"));
        assert!(!filter.contains_key("$or"));
    }

    #[test]
    fn mode_filter_admits_the_universal_tag() {
        let filter = SalonFilter {
            mode: Some(ServiceMode::ToHome),
            ..Default::default()
        }
        .to_document();
        assert_eq!(
            filter.get_document("mode").unwrap(),
            &doc! { "$in": ["toHome", "both"] }
        );
    }

    #[test]
    fn asking_for_the_universal_tag_is_an_equality_match() {
        let filter = SalonFilter {
            mode: Some(ServiceMode::Both),
            ..Default::default()
        }
        .to_document();
        assert_eq!(filter.get_str("mode").unwrap(), "both");
    }

    #[test]
    fn audience_filter_admits_unisex() {
        let filter = ServiceFilter {
            audience: Some(Audience::Men),
            ..Default::default()
        }
        .to_document();
        assert_eq!(
            filter.get_document("audience").unwrap(),
            &doc! { "$in": ["men", "unisex"] }
        );
    }

    #[test]
    fn rating_range_uses_inclusive_bounds() {
        let filter = SalonFilter {
            min_rating: Some(3.5),
            max_rating: Some(5.0),
            ..Default::default()
        }
        .to_document();
        assert_eq!(
            filter.get_document("averageRating").unwrap(),
            &doc! { "$gte": 3.5, "$lte": 5.0 }
        );
    }

    #[test]
    fn price_range_can_be_one_sided() {
        let filter = ServiceFilter {
            max_price: Some(150.0),
            ..Default::default()
        }
        .to_document();
        assert_eq!(
            filter.get_document("price").unwrap(),
            &doc! { "$lte": 150.0 }
        );
    }

    #[test]
    fn text_search_spans_all_salon_fields() {
        let filter = SalonFilter {
            text: Some("nails".to_string()),
            ..Default::default()
        }
        .to_document();
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);
        let first = clauses[0].as_document().unwrap();
        assert_eq!(
            first.get_document("name").unwrap(),
            &doc! { "$regex": "nails", "$options": "i" }
        );
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let filter = ServiceFilter {
            text: Some("wax (full)".to_string()),
            ..Default::default()
        }
        .to_document();
        let clauses = filter.get_array("$or").unwrap();
        let name_clause = clauses[0].as_document().unwrap();
        let pattern = name_clause
            .get_document("name")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(pattern, r"wax \(full\)");
    }

    #[test]
    fn identity_filters_match_exactly() {
        let city = ObjectId::new();
        let category = ObjectId::new();
        let filter = SalonFilter {
            city_id: Some(city),
            category_id: Some(category),
            ..Default::default()
        }
        .to_document();
        assert_eq!(filter.get_object_id("cityId").unwrap(), city);
        assert_eq!(filter.get_object_id("categories").unwrap(), category);
    }
}
