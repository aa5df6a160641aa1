use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::Result;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::salon::{Salon, SalonStatus};

#[derive(Clone)]
pub struct SalonRepository {
    collection: Collection<Salon>,
}

impl SalonRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Salon>("salons");
        SalonRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let slug = IndexModel::builder()
            .keys(doc! { "slug": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(slug, None).await.map(|_| ())
    }

    pub async fn insert(&self, salon: &Salon) -> Result<()> {
        self.collection.insert_one(salon, None).await.map(|_| ())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Salon>> {
        self.collection.find_one(doc! { "_id": id }, None).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Salon>> {
        self.collection.find_one(doc! { "slug": slug }, None).await
    }

    /// Whether another salon than `except` already uses `slug`.
    pub async fn slug_taken(&self, slug: &str, except: Option<ObjectId>) -> Result<bool> {
        let mut filter = doc! { "slug": slug };
        if let Some(id) = except {
            filter.insert("_id", doc! { "$ne": id });
        }
        Ok(self.collection.count_documents(filter, None).await? > 0)
    }

    pub async fn list_newest_first(&self) -> Result<Vec<Salon>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        self.collection.find(None, options).await?.try_collect().await
    }

    /// Applies `changes` as a `$set`, bumping `updated_at`, and returns the
    /// updated salon.
    pub async fn update(&self, id: ObjectId, mut changes: Document) -> Result<Option<Salon>> {
        changes.insert("updated_at", bson::DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes }, options)
            .await
    }

    pub async fn add_revenue(&self, id: ObjectId, delta: f64) -> Result<()> {
        let update = doc! {
            "$inc": { "total_revenue": delta },
            "$set": { "updated_at": bson::DateTime::now() },
        };
        self.collection
            .update_one(doc! { "_id": id }, update, None)
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, id: ObjectId) -> Result<Option<Salon>> {
        self.collection.find_one_and_delete(doc! { "_id": id }, None).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.collection.count_documents(None, None).await
    }

    pub async fn count_by_status(&self, status: SalonStatus) -> Result<u64> {
        self.collection
            .count_documents(doc! { "status": status.as_str() }, None)
            .await
    }

    pub async fn total_revenue(&self) -> Result<f64> {
        let pipeline = [doc! {
            "$group": { "_id": Bson::Null, "total": { "$sum": "$total_revenue" } }
        }];
        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        let total = match cursor.try_next().await? {
            Some(group) => match group.get("total") {
                Some(Bson::Double(total)) => *total,
                Some(Bson::Int32(total)) => f64::from(*total),
                Some(Bson::Int64(total)) => *total as f64,
                _ => 0.0,
            },
            None => 0.0,
        };
        Ok(total)
    }
}
