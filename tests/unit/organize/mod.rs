use super::*;
use chrono::TimeZone;
use std::time::Duration;

fn at(h: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, d, h, 0, 0).unwrap()
}

#[test]
fn canonical_paths_follow_frequency() {
    let org = Organizer::new("base");
    let basis = Utc.with_ymd_and_hms(2023, 5, 8, 10, 42, 7).unwrap();
    assert_eq!(
        org.canonical_path("x", Frequency::Daily, basis),
        PathBuf::from("base/2023/05/08/x.json")
    );
    assert_eq!(
        org.canonical_path("x", Frequency::Hourly, basis),
        PathBuf::from("base/2023/05/08/10/x.json")
    );
    assert_eq!(
        org.canonical_path("x", Frequency::Weekly, basis),
        PathBuf::from("base/2023/05/08/x.json")
    );
    assert_eq!(org.latest_path("x"), PathBuf::from("base/latest/x.json"));
}

#[test]
fn first_artifact_is_latest_until_a_later_one_exists() {
    let dir = tempfile::tempdir().unwrap();
    let org = Organizer::new(dir.path());

    assert!(org.is_latest("x", Frequency::Daily, at(0, 8)).unwrap());
    org.write_artifact(b"{}", "x", Frequency::Daily, at(0, 9)).unwrap();
    assert!(!org.is_latest("x", Frequency::Daily, at(0, 8)).unwrap());
    assert!(org.is_latest("x", Frequency::Daily, at(0, 9)).unwrap());
    assert!(org.is_latest("x", Frequency::Daily, at(0, 10)).unwrap());
    // other names are independent
    assert!(org.is_latest("y", Frequency::Daily, at(0, 8)).unwrap());
}

#[test]
fn hourly_and_daily_layouts_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    let org = Organizer::new(dir.path());
    org.write_artifact(b"{}", "x", Frequency::Hourly, at(23, 9)).unwrap();

    assert_eq!(org.dated_artifacts("x", Frequency::Daily).unwrap().len(), 0);
    assert_eq!(org.dated_artifacts("x", Frequency::Hourly).unwrap().len(), 1);
    assert!(!org.is_latest("x", Frequency::Hourly, at(22, 9)).unwrap());
}

#[test]
fn non_dated_directories_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let org = Organizer::new(dir.path());
    let stray = dir.path().join("2999x/05/08");
    std::fs::create_dir_all(&stray).unwrap();
    std::fs::write(stray.join("x.json"), "{}").unwrap();
    let old = dir.path().join("1999/05/08");
    std::fs::create_dir_all(&old).unwrap();
    std::fs::write(old.join("x.json"), "{}").unwrap();

    assert!(org.dated_artifacts("x", Frequency::Daily).unwrap().is_empty());
}

#[test]
fn write_adds_newline_and_updates_latest_only_for_newest() {
    let dir = tempfile::tempdir().unwrap();
    let org = Organizer::new(dir.path());

    let newer = org.write_artifact(b"new", "x", Frequency::Daily, at(0, 9)).unwrap();
    assert_eq!(std::fs::read(&newer).unwrap(), b"new\n");
    assert_eq!(std::fs::read(org.latest_path("x")).unwrap(), b"new\n");

    let older = org.write_artifact(b"old", "x", Frequency::Daily, at(0, 8)).unwrap();
    assert_eq!(std::fs::read(&older).unwrap(), b"old\n");
    assert_eq!(std::fs::read(org.latest_path("x")).unwrap(), b"new\n");
}

#[test]
fn staleness_compares_modification_time() {
    let dir = tempfile::tempdir().unwrap();
    let org = Organizer::new(dir.path());
    let basis = at(0, 8);

    assert!(org.is_stale_or_missing("x", Frequency::Daily, basis, SystemTime::now()).unwrap());

    org.write_artifact(b"{}", "x", Frequency::Daily, basis).unwrap();
    let mtime = std::fs::metadata(org.canonical_path("x", Frequency::Daily, basis))
        .unwrap()
        .modified()
        .unwrap();
    assert!(!org.is_stale_or_missing("x", Frequency::Daily, basis, mtime).unwrap());
    assert!(
        !org.is_stale_or_missing("x", Frequency::Daily, basis, mtime - Duration::from_secs(60))
            .unwrap()
    );
    assert!(
        org.is_stale_or_missing("x", Frequency::Daily, basis, mtime + Duration::from_secs(60))
            .unwrap()
    );
}
