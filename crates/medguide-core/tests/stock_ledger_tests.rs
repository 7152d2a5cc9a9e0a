//! Stock and dispense ledger integration tests.

use std::thread;

use medguide_core::catalogue::{Catalogue, SeedOptions};
use medguide_core::db::Database;
use medguide_core::error::InventoryError;
use medguide_core::ledger::DispenseLedger;
use medguide_core::models::{Account, MedicineFields};
use medguide_core::profiles::Profiles;

fn staff(id: i64) -> Account {
    Account {
        id,
        full_name: Some(format!("Doctor {}", id)),
        email: None,
        is_staff: true,
    }
}

#[test]
fn test_dispense_from_seeded_catalogue() {
    let db = Database::open_in_memory().unwrap();
    let catalogue = Catalogue::new(&db);
    catalogue.seed_default(SeedOptions::default()).unwrap();

    catalogue
        .upsert("MG-00001", &MedicineFields::new("Адеметионин", 100, 453))
        .unwrap();
    let medicine = catalogue.find_by_qr_payload("med:MG-00001").unwrap();
    let doctor = Profiles::new(&db).get_or_create_profile(&staff(1)).unwrap();

    let event = DispenseLedger::new(&db)
        .record_dispense(doctor.id, medicine.id, 10)
        .unwrap();
    assert_eq!(event.quantity, 10);

    let after = catalogue.find_by_article("MG-00001").unwrap();
    assert_eq!(after.stock, 443);
    assert_eq!(after.diff, -343);
    assert_eq!(db.total_dispensed(medicine.id).unwrap(), 10);
}

#[test]
fn test_over_dispense_never_goes_negative() {
    let db = Database::open_in_memory().unwrap();
    let catalogue = Catalogue::new(&db);
    let medicine = catalogue
        .upsert("MG-00010", &MedicineFields::new("Азитромицин", 6, 2))
        .unwrap();
    let doctor = Profiles::new(&db).get_or_create_profile(&staff(1)).unwrap();
    let ledger = DispenseLedger::new(&db);

    ledger.record_dispense(doctor.id, medicine.id, 5).unwrap();
    ledger.record_dispense(doctor.id, medicine.id, 1).unwrap();

    let after = catalogue.get(medicine.id).unwrap();
    assert_eq!(after.stock, 0);
    assert_eq!(after.diff, 6);
    assert_eq!(ledger.list_by_doctor(doctor.id).unwrap().len(), 2);
}

#[test]
fn test_rejected_dispense_changes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let catalogue = Catalogue::new(&db);
    let medicine = catalogue
        .upsert("MG-00001", &MedicineFields::new("Альбумин", 90, 48))
        .unwrap();
    let doctor = Profiles::new(&db).get_or_create_profile(&staff(1)).unwrap();
    let ledger = DispenseLedger::new(&db);

    let err = ledger.record_dispense(doctor.id, medicine.id, 0).unwrap_err();
    assert!(matches!(err, InventoryError::Validation(_)));
    assert!(!err.is_retryable());

    assert_eq!(catalogue.get(medicine.id).unwrap().stock, 48);
    assert!(ledger.list_by_doctor(doctor.id).unwrap().is_empty());
}

#[test]
fn test_history_survives_medicine_removal() {
    let db = Database::open_in_memory().unwrap();
    let catalogue = Catalogue::new(&db);
    let medicine = catalogue
        .upsert("MG-00003", &MedicineFields::new("Уголь активированный", 200, 500))
        .unwrap();
    let doctor = Profiles::new(&db).get_or_create_profile(&staff(1)).unwrap();
    let ledger = DispenseLedger::new(&db);

    let event = ledger.record_dispense(doctor.id, medicine.id, 20).unwrap();
    catalogue.delete("MG-00003").unwrap();

    let history = ledger.list_by_doctor(doctor.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event.id, event.id);
    assert_eq!(history[0].event.medicine_id, None);
    assert!(history[0].medicine.is_none());
}

#[test]
fn test_concurrent_dispenses_lose_no_updates() {
    const WORKERS: i64 = 8;
    const PER_WORKER: i64 = 5;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medguide.db");

    let (medicine_id, doctor_id) = {
        let db = Database::open(&path).unwrap();
        let medicine = Catalogue::new(&db)
            .upsert("MG-00001", &MedicineFields::new("Адеметионин", 20, 100))
            .unwrap();
        let doctor = Profiles::new(&db).get_or_create_profile(&staff(1)).unwrap();
        (medicine.id, doctor.id)
    };

    // Open every connection up front; each worker owns its own.
    let connections: Vec<Database> = (0..WORKERS).map(|_| Database::open(&path).unwrap()).collect();

    let handles: Vec<_> = connections
        .into_iter()
        .map(|db| {
            thread::spawn(move || {
                let ledger = DispenseLedger::new(&db);
                for _ in 0..PER_WORKER {
                    loop {
                        match ledger.record_dispense(doctor_id, medicine_id, 1) {
                            Ok(_) => break,
                            Err(e) if e.is_retryable() => continue,
                            Err(e) => panic!("dispense failed: {}", e),
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let medicine = Catalogue::new(&db).get(medicine_id).unwrap();
    assert_eq!(medicine.stock, 100 - WORKERS * PER_WORKER);
    assert_eq!(medicine.diff, 20 - medicine.stock);
    assert_eq!(db.count_dispense_events().unwrap(), (WORKERS * PER_WORKER) as usize);
    assert_eq!(db.total_dispensed(medicine_id).unwrap(), WORKERS * PER_WORKER);
}

#[test]
fn test_concurrent_profile_creation_yields_one_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medguide.db");
    Database::open(&path).unwrap();

    let connections: Vec<Database> = (0..4).map(|_| Database::open(&path).unwrap()).collect();
    let handles: Vec<_> = connections
        .into_iter()
        .map(|db| {
            thread::spawn(move || loop {
                match Profiles::new(&db).get_or_create_profile(&staff(42)) {
                    Ok(profile) => return profile.id,
                    Err(e) if e.is_retryable() => continue,
                    Err(e) => panic!("profile creation failed: {}", e),
                }
            })
        })
        .collect();

    let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));
}
