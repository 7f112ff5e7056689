use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::import::row_mapper::{CellValue, RowMapper, HEADER_ALIASES};
use service::import::workbook::Sheet;
use service::import::xldate::DateSystem;
use service::prestation::repository::mock::InMemoryPrestationRepository;
use service::prestation::PrestationService;

fn headers() -> Vec<String> {
    HEADER_ALIASES.iter().map(|(label, _)| label.to_string()).collect()
}

fn row(i: usize) -> Vec<CellValue> {
    let text = |s: String| CellValue::Text(s);
    vec![
        CellValue::Float(i as f64),
        CellValue::Float(45356.0 + (i % 300) as f64),
        text(format!("Nom{i}")),
        text("Prenom".into()),
        text(format!("F-{i:06}")),
        CellValue::Float(1000.0 + i as f64),
        text(format!("M{}", i % 97)),
        text("Cardiologie".into()),
        text("Consultation".into()),
        CellValue::Float(80.0),
        text("12.345".into()),
        CellValue::Float(49.38),
        CellValue::Float(61.725),
        CellValue::Empty,
    ]
}

fn bench_map_row(c: &mut Criterion) {
    let mapper = RowMapper::new(&headers()[..], DateSystem::Excel1900);
    let cells = row(42);
    c.bench_function("row_mapper_map", |b| {
        b.iter(|| mapper.map(black_box(&cells)).unwrap());
    });
}

fn bench_import_sheet(c: &mut Criterion) {
    let sheet = Sheet { headers: headers(), rows: (0..1000).map(row).collect(), date_system: DateSystem::Excel1900 };
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("import_sheet_1000_rows", |b| {
        b.iter(|| {
            let svc = PrestationService::new(Arc::new(InMemoryPrestationRepository::new()), 1000);
            rt.block_on(svc.import_sheet(black_box(&sheet))).unwrap()
        });
    });
}

criterion_group!(benches, bench_map_row, bench_import_sheet);
criterion_main!(benches);
