use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::Result;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::service::Service;

#[derive(Clone)]
pub struct ServiceRepository {
    collection: Collection<Service>,
}

impl ServiceRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Service>("services");
        ServiceRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let salon = IndexModel::builder().keys(doc! { "salon_id": 1 }).build();
        self.collection.create_index(salon, None).await.map(|_| ())
    }

    pub async fn insert(&self, service: &Service) -> Result<()> {
        self.collection.insert_one(service, None).await.map(|_| ())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Service>> {
        self.collection.find_one(doc! { "_id": id }, None).await
    }

    pub async fn find_many(&self, ids: Vec<ObjectId>) -> Result<Vec<Service>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "_id": { "$in": ids } };
        self.collection.find(filter, None).await?.try_collect().await
    }

    /// Bookable services of a salon, alphabetical.
    pub async fn list_active(&self, salon_id: ObjectId) -> Result<Vec<Service>> {
        let filter = doc! { "salon_id": salon_id, "is_active": true };
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        self.collection.find(filter, options).await?.try_collect().await
    }

    pub async fn update(&self, id: ObjectId, mut changes: Document) -> Result<Option<Service>> {
        changes.insert("updated_at", bson::DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes }, options)
            .await
    }

    /// Soft delete: the service disappears from booking but old appointments
    /// still resolve it.
    pub async fn deactivate(&self, id: ObjectId) -> Result<Option<Service>> {
        self.update(id, doc! { "is_active": false }).await
    }

    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn delete_by_salon(&self, salon_id: ObjectId) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "salon_id": salon_id }, None)
            .await?;
        Ok(result.deleted_count)
    }
}
