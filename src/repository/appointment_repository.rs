use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::Result;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::appointment::Appointment;

#[derive(Clone)]
pub struct AppointmentRepository {
    collection: Collection<Appointment>,
}

/// Which appointments a listing or notification query covers. An empty
/// scope matches everything, so callers validate before building one.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentScope {
    pub salon_id: Option<ObjectId>,
    pub staff_id: Option<ObjectId>,
}

impl AppointmentScope {
    fn to_filter(self) -> Document {
        let mut filter = Document::new();
        if let Some(salon_id) = self.salon_id {
            filter.insert("salon_id", salon_id);
        }
        if let Some(staff_id) = self.staff_id {
            filter.insert("staff_id", staff_id);
        }
        filter
    }

    fn unread(self) -> Document {
        let mut filter = self.to_filter();
        filter.insert("is_read", false);
        filter
    }
}

impl AppointmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Appointment>("appointments");
        AppointmentRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let salon = IndexModel::builder()
            .keys(doc! { "salon_id": 1, "appointment_date": 1, "appointment_time": 1 })
            .build();
        let staff = IndexModel::builder().keys(doc! { "staff_id": 1 }).build();
        self.collection
            .create_indexes([salon, staff], None)
            .await
            .map(|_| ())
    }

    pub async fn insert(&self, appointment: &Appointment) -> Result<()> {
        self.collection.insert_one(appointment, None).await.map(|_| ())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Appointment>> {
        self.collection.find_one(doc! { "_id": id }, None).await
    }

    /// Chronological: by date, then time of day.
    pub async fn list(&self, scope: AppointmentScope) -> Result<Vec<Appointment>> {
        let options = FindOptions::builder()
            .sort(doc! { "appointment_date": 1, "appointment_time": 1 })
            .build();
        self.collection
            .find(scope.to_filter(), options)
            .await?
            .try_collect()
            .await
    }

    pub async fn list_by_staff(&self, staff_id: ObjectId) -> Result<Vec<Appointment>> {
        self.collection
            .find(doc! { "staff_id": staff_id }, None)
            .await?
            .try_collect()
            .await
    }

    pub async fn update(&self, id: ObjectId, mut changes: Document) -> Result<Option<Appointment>> {
        changes.insert("updated_at", bson::DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes }, options)
            .await
    }

    pub async fn mark_read(&self, id: ObjectId) -> Result<Option<Appointment>> {
        self.update(id, doc! { "is_read": true }).await
    }

    pub async fn count_unread(&self, scope: AppointmentScope) -> Result<u64> {
        self.collection.count_documents(scope.unread(), None).await
    }

    /// Returns how many appointments flipped to read.
    pub async fn mark_all_read(&self, scope: AppointmentScope) -> Result<u64> {
        let update = doc! { "$set": { "is_read": true, "updated_at": bson::DateTime::now() } };
        let result = self
            .collection
            .update_many(scope.unread(), update, None)
            .await?;
        Ok(result.modified_count)
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

    pub async fn count_by_salon(&self, salon_id: ObjectId) -> Result<u64> {
        self.collection
            .count_documents(doc! { "salon_id": salon_id }, None)
            .await
    }
}
