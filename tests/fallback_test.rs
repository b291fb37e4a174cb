//! Tests for the local key-value store

use chrono::{NaiveDate, NaiveTime, Utc};
use tempfile::tempdir;
use uuid::Uuid;

use medidash::auth::{AuthUser, Session};
use medidash::fallback::{DemoAppointment, LocalStore};
use medidash::models::AppointmentStatus;

fn session() -> Session {
    Session {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_in: 3600,
        user: AuthUser { id: Uuid::new_v4(), email: Some("ada@example.com".to_string()) },
    }
}

fn demo(user_id: Uuid, day: u32, hour: u32) -> DemoAppointment {
    DemoAppointment {
        id: Uuid::new_v4(),
        user_id,
        doctor_id: Uuid::new_v4(),
        doctor_name: "Dr. Emily Carter".to_string(),
        specialization: "Cardiology".to_string(),
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        reason: Some("Palpitations".to_string()),
        status: AppointmentStatus::Pending,
        created_at: Utc::now(),
    }
}

#[test]
fn test_session_survives_reopen() {
    let dir = tempdir().unwrap();
    let saved = session();

    {
        let store = LocalStore::open(dir.path()).unwrap();
        assert!(store.load_session().unwrap().is_none());
        store.save_session(&saved).unwrap();
    }

    let store = LocalStore::open(dir.path()).unwrap();
    let loaded = store.load_session().unwrap().unwrap();
    assert_eq!(loaded.access_token, "access");
    assert_eq!(loaded.user.id, saved.user.id);

    store.clear_session().unwrap();
    assert!(store.load_session().unwrap().is_none());
}

#[test]
fn test_demo_appointments_sorted_and_filtered() {
    let store = LocalStore::temporary().unwrap();
    let (ada, alan) = (Uuid::new_v4(), Uuid::new_v4());

    store.save_demo_appointment(&demo(ada, 12, 9)).unwrap();
    store.save_demo_appointment(&demo(ada, 10, 15)).unwrap();
    store.save_demo_appointment(&demo(ada, 10, 11)).unwrap();
    store.save_demo_appointment(&demo(alan, 1, 9)).unwrap();

    let mine = store.demo_appointments(Some(ada)).unwrap();
    let slots: Vec<(u32, String)> = mine
        .iter()
        .map(|a| (chrono::Datelike::day(&a.appointment_date), a.appointment_time.format("%H:%M").to_string()))
        .collect();
    assert_eq!(slots, [(10, "11:00".to_string()), (10, "15:00".to_string()), (12, "09:00".to_string())]);

    assert_eq!(store.demo_appointments(None).unwrap().len(), 4);
}

#[test]
fn test_clear_demo_appointments() {
    let store = LocalStore::temporary().unwrap();
    let user = Uuid::new_v4();
    store.save_demo_appointment(&demo(user, 5, 10)).unwrap();
    store.save_demo_appointment(&demo(user, 6, 10)).unwrap();
    store.save_session(&session()).unwrap();

    assert_eq!(store.clear_demo_appointments().unwrap(), 2);
    assert!(store.demo_appointments(None).unwrap().is_empty());
    assert!(store.load_session().unwrap().is_some());
}
