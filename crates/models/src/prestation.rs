use rust_decimal::prelude::ToPrimitive;
use sea_orm::{entity::prelude::*, ActiveValue::NotSet, ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::NewPrestation;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prestations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_number: Option<i32>,
    pub date: Date,
    pub last_name: String,
    pub first_name: String,
    pub invoice_number: String,
    pub patient_index: String,
    pub matricule: String,
    pub specialty: String,
    pub act: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub rate_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub patient_share: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub employee_share: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub adjustment: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<NewPrestation> for ActiveModel {
    fn from(r: NewPrestation) -> Self {
        ActiveModel {
            id: NotSet,
            order_number: Set(r.order_number),
            date: Set(r.date),
            last_name: Set(r.last_name),
            first_name: Set(r.first_name),
            invoice_number: Set(r.invoice_number),
            patient_index: Set(r.patient_index),
            matricule: Set(r.matricule),
            specialty: Set(r.specialty),
            act: Set(r.act),
            rate_percent: Set(r.rate_percent),
            patient_share: Set(r.patient_share),
            employee_share: Set(r.employee_share),
            total_amount: Set(r.total_amount),
            adjustment: Set(r.adjustment),
        }
    }
}

impl From<Model> for NewPrestation {
    fn from(m: Model) -> Self {
        NewPrestation {
            order_number: m.order_number,
            date: m.date,
            last_name: m.last_name,
            first_name: m.first_name,
            invoice_number: m.invoice_number,
            patient_index: m.patient_index,
            matricule: m.matricule,
            specialty: m.specialty,
            act: m.act,
            rate_percent: m.rate_percent,
            patient_share: m.patient_share,
            employee_share: m.employee_share,
            total_amount: m.total_amount,
            adjustment: m.adjustment,
        }
    }
}

impl Model {
    /// Build a stored row from a validated record, as the in-memory store does.
    pub fn from_record(id: i32, r: NewPrestation) -> Self {
        Model {
            id,
            order_number: r.order_number,
            date: r.date,
            last_name: r.last_name,
            first_name: r.first_name,
            invoice_number: r.invoice_number,
            patient_index: r.patient_index,
            matricule: r.matricule,
            specialty: r.specialty,
            act: r.act,
            rate_percent: r.rate_percent,
            patient_share: r.patient_share,
            employee_share: r.employee_share,
            total_amount: r.total_amount,
            adjustment: r.adjustment,
        }
    }
}

/// JSON view of a stored prestation. Amounts travel as numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestationRead {
    pub id: i32,
    pub order_number: Option<i32>,
    pub date: Date,
    pub last_name: String,
    pub first_name: String,
    pub invoice_number: String,
    pub patient_index: String,
    pub matricule: String,
    pub specialty: String,
    pub act: String,
    pub rate_percent: f64,
    pub patient_share: f64,
    pub employee_share: f64,
    pub total_amount: f64,
    pub adjustment: f64,
}

impl From<Model> for PrestationRead {
    fn from(m: Model) -> Self {
        PrestationRead {
            id: m.id,
            order_number: m.order_number,
            date: m.date,
            last_name: m.last_name,
            first_name: m.first_name,
            invoice_number: m.invoice_number,
            patient_index: m.patient_index,
            matricule: m.matricule,
            specialty: m.specialty,
            act: m.act,
            rate_percent: m.rate_percent.to_f64().unwrap_or_default(),
            patient_share: m.patient_share.to_f64().unwrap_or_default(),
            employee_share: m.employee_share.to_f64().unwrap_or_default(),
            total_amount: m.total_amount.to_f64().unwrap_or_default(),
            adjustment: m.adjustment.to_f64().unwrap_or_default(),
        }
    }
}

/// Insert a validated record.
pub async fn create<C: ConnectionTrait>(db: &C, record: NewPrestation) -> Result<Model, ModelError> {
    ActiveModel::from(record)
        .insert(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Overwrite every column of row `id`. Returns `None` when the row does not exist.
pub async fn replace<C: ConnectionTrait>(db: &C, id: i32, record: NewPrestation) -> Result<Option<Model>, ModelError> {
    let mut am = ActiveModel::from(record);
    am.id = Set(id);
    match am.update(db).await {
        Ok(m) => Ok(Some(m)),
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(ModelError::Db(e.to_string())),
    }
}
