use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::error::Result;
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::push_subscription::PushSubscription;

#[derive(Clone)]
pub struct PushSubscriptionRepository {
    collection: Collection<PushSubscription>,
}

pub struct NewSubscription<'a> {
    pub user_id: ObjectId,
    pub endpoint: &'a str,
    pub p256dh: &'a str,
    pub auth: &'a str,
    pub user_agent: Option<&'a str>,
}

impl PushSubscriptionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<PushSubscription>("push_subscriptions");
        PushSubscriptionRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let endpoint = IndexModel::builder()
            .keys(doc! { "endpoint": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(endpoint, None).await.map(|_| ())
    }

    /// Inserts or rebinds the subscription for `endpoint`, stamping
    /// `last_used_at`.
    pub async fn upsert(&self, new: NewSubscription<'_>) -> Result<Option<PushSubscription>> {
        let now = bson::DateTime::now();
        let update = doc! {
            "$set": {
                "user_id": new.user_id,
                "p256dh": new.p256dh,
                "auth": new.auth,
                "user_agent": new.user_agent,
                "last_used_at": now,
                "updated_at": now,
            },
            "$setOnInsert": { "_id": ObjectId::new(), "created_at": now },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        self.collection
            .find_one_and_update(doc! { "endpoint": new.endpoint }, update, options)
            .await
    }

    pub async fn list_for_users(&self, user_ids: Vec<ObjectId>) -> Result<Vec<PushSubscription>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "user_id": { "$in": user_ids } };
        self.collection.find(filter, None).await?.try_collect().await
    }

    pub async fn touch(&self, id: ObjectId) -> Result<()> {
        let update = doc! { "$set": { "last_used_at": bson::DateTime::now() } };
        self.collection
            .update_one(doc! { "_id": id }, update, None)
            .await
            .map(|_| ())
    }

    /// Drops a subscription the push service reported as gone.
    pub async fn delete_by_id(&self, id: ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn delete(&self, endpoint: &str, user_id: ObjectId) -> Result<bool> {
        let filter = doc! { "endpoint": endpoint, "user_id": user_id };
        let result = self.collection.delete_one(filter, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn delete_for_users(&self, user_ids: Vec<ObjectId>) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let filter = doc! { "user_id": { "$in": user_ids } };
        let result = self.collection.delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }
}
