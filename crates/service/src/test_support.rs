#![cfg(test)]
use chrono::NaiveDate;
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::connect_with_config;
use models::prestation::Model;
use models::record::{NewPrestation, PrestationInput};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn test_config(max_connections: u32) -> anyhow::Result<DatabaseConfig> {
    let mut cfg = DatabaseConfig::default();
    cfg.normalize_from_env();
    cfg.validate()?;
    cfg.max_connections = cfg.max_connections.max(max_connections);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    Ok(cfg)
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&test_config(10)?).await?;
            migration::Migrator::up(&db, None).await?;
            drop(db);
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    let db = connect_with_config(&test_config(20)?).await?;
    Ok(db)
}

/// Valid record dated 2024-03-05 with the given matricule.
pub fn sample_record(matricule: &str) -> NewPrestation {
    PrestationInput {
        order_number: Some(7),
        date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        last_name: "Diallo".into(),
        first_name: "Awa".into(),
        invoice_number: "F-2024-001".into(),
        patient_index: "P-9".into(),
        matricule: matricule.into(),
        specialty: "Cardiologie".into(),
        act: "Consultation".into(),
        rate_percent: 80.0,
        patient_share: 12.5,
        employee_share: 50.0,
        total_amount: 62.5,
        adjustment: 0.0,
    }
    .validate()
    .unwrap()
}

/// Stored row built from [`sample_record`] with matricule `M123`.
pub fn sample_model(id: i32) -> Model {
    Model::from_record(id, sample_record("M123"))
}
