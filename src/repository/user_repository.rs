// src/repository/user_repository.rs
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::Result;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::user::{normalize_email, Role, User};

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<User>("users");
        UserRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let salon = IndexModel::builder()
            .keys(doc! { "salon_id": 1, "role": 1 })
            .build();
        self.collection
            .create_indexes([email, salon], None)
            .await
            .map(|_| ())
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user, None).await.map(|_| ())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        self.collection.find_one(doc! { "_id": id }, None).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let filter = doc! { "email": normalize_email(email) };
        self.collection.find_one(filter, None).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let filter = doc! { "email": normalize_email(email) };
        Ok(self.collection.count_documents(filter, None).await? > 0)
    }

    /// Staff of a salon, most recently added first.
    pub async fn list_staff(&self, salon_id: ObjectId) -> Result<Vec<User>> {
        let filter = doc! { "salon_id": salon_id, "role": Role::Staff.as_str() };
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        self.collection.find(filter, options).await?.try_collect().await
    }

    pub async fn find_staff(&self, id: ObjectId) -> Result<Option<User>> {
        let filter = doc! { "_id": id, "role": Role::Staff.as_str() };
        self.collection.find_one(filter, None).await
    }

    pub async fn find_owner(&self, salon_id: ObjectId) -> Result<Option<User>> {
        let filter = doc! { "salon_id": salon_id, "role": Role::Owner.as_str() };
        self.collection.find_one(filter, None).await
    }

    pub async fn find_many(&self, ids: Vec<ObjectId>) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "_id": { "$in": ids } };
        self.collection.find(filter, None).await?.try_collect().await
    }

    /// Applies `changes` to a staff member only; owners and admins are never
    /// matched.
    pub async fn update_staff(&self, id: ObjectId, mut changes: Document) -> Result<Option<User>> {
        changes.insert("updated_at", bson::DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let filter = doc! { "_id": id, "role": Role::Staff.as_str() };
        self.collection
            .find_one_and_update(filter, doc! { "$set": changes }, options)
            .await
    }

    pub async fn set_password_hash(&self, id: ObjectId, password_hash: &str) -> Result<()> {
        let update = doc! {
            "$set": { "password_hash": password_hash, "updated_at": bson::DateTime::now() }
        };
        self.collection
            .update_one(doc! { "_id": id }, update, None)
            .await
            .map(|_| ())
    }

    pub async fn delete_staff(&self, id: ObjectId) -> Result<Option<User>> {
        let filter = doc! { "_id": id, "role": Role::Staff.as_str() };
        self.collection.find_one_and_delete(filter, None).await
    }

    pub async fn ids_by_salon(&self, salon_id: ObjectId) -> Result<Vec<ObjectId>> {
        let users: Vec<User> = self
            .collection
            .find(doc! { "salon_id": salon_id }, None)
            .await?
            .try_collect()
            .await?;
        Ok(users.into_iter().map(|user| user.id).collect())
    }

    pub async fn delete_by_salon(&self, salon_id: ObjectId) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "salon_id": salon_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn count_staff(&self, salon_id: ObjectId) -> Result<u64> {
        let filter = doc! { "salon_id": salon_id, "role": Role::Staff.as_str() };
        self.collection.count_documents(filter, None).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.collection.count_documents(None, None).await
    }
}
