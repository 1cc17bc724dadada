use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

use super::{
    booking_repo, favorite_repo, location_repo, notification_repo, promo_repo, provider_repo,
    review_repo, salon_repo, service_repo, short_repo, taxonomy_repo, user_repo,
};

fn index(keys: Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn unique(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

/// Declares every index the queries rely on. Creation is idempotent, the
/// server ignores indexes that already exist. The 2dsphere index on salon
/// locations is required before any `$geoNear` runs.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    db.collection::<Document>(salon_repo::COLLECTION)
        .create_indexes([
            index(doc! { "location": "2dsphere" }),
            unique(doc! { "slug": 1 }),
            index(doc! { "cityId": 1, "isActive": 1 }),
            index(doc! { "areaId": 1, "isActive": 1 }),
            index(doc! { "popularityScore": -1 }),
        ])
        .await?;

    db.collection::<Document>(service_repo::COLLECTION)
        .create_indexes([
            index(doc! { "salonId": 1, "isActive": 1 }),
            index(doc! { "serviceTypeId": 1 }),
            index(doc! { "categoryId": 1 }),
            index(doc! { "price": 1 }),
        ])
        .await?;

    db.collection::<Document>(location_repo::CITIES)
        .create_index(unique(doc! { "slug": 1 }))
        .await?;
    db.collection::<Document>(location_repo::AREAS)
        .create_indexes([unique(doc! { "slug": 1 }), index(doc! { "cityId": 1 })])
        .await?;

    db.collection::<Document>(taxonomy_repo::CATEGORIES)
        .create_index(unique(doc! { "slug": 1 }))
        .await?;
    db.collection::<Document>(taxonomy_repo::TYPES)
        .create_indexes([unique(doc! { "slug": 1 }), index(doc! { "categoryId": 1 })])
        .await?;

    db.collection::<Document>(provider_repo::COLLECTION)
        .create_indexes([
            index(doc! { "salonId": 1, "isActive": 1 }),
            index(doc! { "specializations": 1 }),
        ])
        .await?;

    db.collection::<Document>(booking_repo::COLLECTION)
        .create_indexes([
            unique(doc! { "bookingNumber": 1 }),
            index(doc! { "customerId": 1, "createdAt": -1 }),
            index(doc! { "salonId": 1, "createdAt": -1 }),
        ])
        .await?;

    db.collection::<Document>(review_repo::SALON_REVIEWS)
        .create_index(index(doc! { "salonId": 1, "createdAt": -1 }))
        .await?;
    db.collection::<Document>(review_repo::PROVIDER_REVIEWS)
        .create_index(index(doc! { "providerId": 1, "createdAt": -1 }))
        .await?;

    db.collection::<Document>(favorite_repo::COLLECTION)
        .create_index(unique(doc! { "userId": 1, "salonId": 1 }))
        .await?;

    db.collection::<Document>(notification_repo::COLLECTION)
        .create_index(index(doc! { "userId": 1, "createdAt": -1 }))
        .await?;

    db.collection::<Document>(promo_repo::COLLECTION)
        .create_index(unique(doc! { "code": 1 }))
        .await?;

    db.collection::<Document>(short_repo::SHORTS)
        .create_indexes([
            index(doc! { "isActive": 1, "createdAt": -1 }),
            index(doc! { "tags": 1 }),
            index(doc! { "authorId": 1 }),
        ])
        .await?;
    db.collection::<Document>(short_repo::LIKES)
        .create_index(unique(doc! { "shortId": 1, "userId": 1 }))
        .await?;
    db.collection::<Document>(short_repo::BOOKMARKS)
        .create_index(unique(doc! { "shortId": 1, "userId": 1 }))
        .await?;
    db.collection::<Document>(short_repo::COMMENTS)
        .create_index(index(doc! { "shortId": 1, "createdAt": -1 }))
        .await?;
    db.collection::<Document>(short_repo::FOLLOWS)
        .create_index(unique(doc! { "followerId": 1, "authorId": 1 }))
        .await?;

    db.collection::<Document>(user_repo::USERS)
        .create_index(unique(doc! { "email": 1 }))
        .await?;
    db.collection::<Document>(user_repo::ADDRESSES)
        .create_index(index(doc! { "userId": 1 }))
        .await?;

    Ok(())
}
